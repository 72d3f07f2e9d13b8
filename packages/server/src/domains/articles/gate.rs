// Generation gate - single-flight + cadence state machine
//
// Answers, for "the current moment", exactly one of three verdicts:
// RETURN_EXISTING, GENERATE_NEW, or BLOCKED_IN_FLIGHT. The decision combines
// wall-clock position relative to the daily reset boundary, the most recent
// persisted article's creation time, and process-local in-flight/cooldown
// state.
//
// KNOWN LIMITATION: the lock state is process-local. In a horizontally
// scaled deployment every process keeps its own gate, so the single-flight
// guarantee only holds within one process; across processes a small bounded
// number of duplicate generations is possible. The `GateLock` trait is the
// seam for promoting this to a shared store with a conditional insert (a
// generation-in-progress marker row with a TTL) without touching the verdict
// logic.

use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use tracing::debug;

/// What the gate tells a caller to do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    /// Serve whatever is currently the latest persisted article (may be none).
    ReturnExisting,
    /// A new generation attempt is warranted.
    GenerateNew,
    /// Another generation is running in this process; serve the latest
    /// article immediately instead of waiting for it.
    BlockedInFlight,
}

/// Configured daily reset boundary (hour:minute, local time).
///
/// The "article day" rolls over at this boundary, not at midnight.
#[derive(Debug, Clone, Copy)]
pub struct ResetBoundary {
    hour: u32,
    minute: u32,
}

impl ResetBoundary {
    pub fn new(hour: u32, minute: u32) -> Self {
        debug_assert!(hour < 24 && minute < 60);
        Self { hour, minute }
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).expect("validated in constructor")
    }

    /// True once the clock is at or past the boundary.
    pub fn is_past(&self, now: NaiveDateTime) -> bool {
        now.time() >= self.time()
    }

    /// The logical "article day" for a wall-clock instant: before the
    /// boundary it is still yesterday's date.
    pub fn logical_date(&self, now: NaiveDateTime) -> NaiveDate {
        if self.is_past(now) {
            now.date()
        } else {
            now.date().pred_opt().unwrap_or(now.date())
        }
    }

    /// Seconds until the next boundary crossing.
    pub fn seconds_until_reset(&self, now: NaiveDateTime) -> i64 {
        let mut target = now.date().and_time(self.time());
        if now >= target {
            target += TimeDelta::days(1);
        }
        (target - now).num_seconds()
    }
}

// =============================================================================
// Lock state
// =============================================================================

/// Outcome of an atomic begin attempt on the gate lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockDecision {
    /// Lock acquired; the caller owns the generation attempt.
    Acquired,
    /// Another attempt is in flight.
    InFlight,
    /// A recent attempt is still inside the cooldown window.
    CoolingDown,
    /// The `allow` predicate declined (nothing is due).
    Declined,
}

/// Mutual-exclusion + debounce state for generation attempts.
///
/// `try_begin` must be atomic: checking in-flight, checking the cooldown,
/// evaluating `allow`, and setting in-flight must happen as one step with
/// respect to concurrent callers of the same lock.
pub trait GateLock: Send + Sync {
    /// Atomically attempt to begin a generation.
    ///
    /// `allow` evaluates the cadence rules (reset boundary and latest
    /// article); it runs only when the lock is free and cooled down.
    fn try_begin(
        &self,
        now: NaiveDateTime,
        cooldown: TimeDelta,
        allow: &dyn Fn() -> bool,
    ) -> LockDecision;

    /// Release the lock and stamp the attempt time. Called exactly once per
    /// successful `try_begin`, on every exit path.
    fn release(&self, now: NaiveDateTime);

    /// Current state, for read-only verdicts: (in_flight, last_attempt_at).
    fn snapshot(&self) -> (bool, Option<NaiveDateTime>);
}

#[derive(Debug, Default)]
struct LockState {
    in_flight: bool,
    last_attempt_at: Option<NaiveDateTime>,
}

/// In-process implementation backed by a mutex.
///
/// The mutex is only held for the duration of the check-and-set, never
/// across I/O.
#[derive(Debug, Default)]
pub struct LocalGateLock {
    state: Mutex<LockState>,
}

impl GateLock for LocalGateLock {
    fn try_begin(
        &self,
        now: NaiveDateTime,
        cooldown: TimeDelta,
        allow: &dyn Fn() -> bool,
    ) -> LockDecision {
        let mut state = self.state.lock().expect("gate lock poisoned");
        if state.in_flight {
            return LockDecision::InFlight;
        }
        if let Some(last) = state.last_attempt_at {
            if now - last < cooldown {
                return LockDecision::CoolingDown;
            }
        }
        if !allow() {
            return LockDecision::Declined;
        }
        state.in_flight = true;
        LockDecision::Acquired
    }

    fn release(&self, now: NaiveDateTime) {
        let mut state = self.state.lock().expect("gate lock poisoned");
        state.in_flight = false;
        state.last_attempt_at = Some(now);
    }

    fn snapshot(&self) -> (bool, Option<NaiveDateTime>) {
        let state = self.state.lock().expect("gate lock poisoned");
        (state.in_flight, state.last_attempt_at)
    }
}

// =============================================================================
// Gate
// =============================================================================

pub struct GenerationGate {
    boundary: ResetBoundary,
    cooldown: TimeDelta,
    lock: Box<dyn GateLock>,
}

impl GenerationGate {
    /// Gate with the default in-process lock.
    pub fn new(boundary: ResetBoundary, cooldown: std::time::Duration) -> Self {
        Self::with_lock(boundary, cooldown, Box::new(LocalGateLock::default()))
    }

    /// Gate with a caller-supplied lock implementation.
    pub fn with_lock(
        boundary: ResetBoundary,
        cooldown: std::time::Duration,
        lock: Box<dyn GateLock>,
    ) -> Self {
        Self {
            boundary,
            cooldown: TimeDelta::from_std(cooldown).unwrap_or(TimeDelta::minutes(5)),
            lock,
        }
    }

    pub fn boundary(&self) -> ResetBoundary {
        self.boundary
    }

    pub fn logical_date(&self, now: NaiveDateTime) -> NaiveDate {
        self.boundary.logical_date(now)
    }

    pub fn seconds_until_reset(&self, now: NaiveDateTime) -> i64 {
        self.boundary.seconds_until_reset(now)
    }

    /// Cadence rules only (no lock state): is a fresh article due?
    ///
    /// Due when past today's reset boundary and the latest article either
    /// does not exist, was created on an earlier calendar day, or was
    /// created today but before the boundary fired.
    fn generation_due(&self, now: NaiveDateTime, latest_created_at: Option<NaiveDateTime>) -> bool {
        if !self.boundary.is_past(now) {
            return false;
        }
        match latest_created_at {
            None => true,
            Some(created) => {
                created.date() != now.date() || created.time() < self.boundary.time()
            }
        }
    }

    /// Read-only verdict for the current moment.
    ///
    /// `force` short-circuits to `GenerateNew` regardless of lock and
    /// cadence state; forced results must never be persisted as the new
    /// canonical latest article.
    pub fn verdict(
        &self,
        now: NaiveDateTime,
        latest_created_at: Option<NaiveDateTime>,
        force: bool,
    ) -> GateVerdict {
        if force {
            return GateVerdict::GenerateNew;
        }
        let (in_flight, last_attempt_at) = self.lock.snapshot();
        if in_flight {
            return GateVerdict::BlockedInFlight;
        }
        if let Some(last) = last_attempt_at {
            if now - last < self.cooldown {
                return GateVerdict::ReturnExisting;
            }
        }
        if self.generation_due(now, latest_created_at) {
            GateVerdict::GenerateNew
        } else {
            GateVerdict::ReturnExisting
        }
    }

    /// Attempt to own a generation for the current moment.
    ///
    /// On success the returned guard holds the single-flight slot; dropping
    /// it releases the slot and stamps the attempt time, on every exit path
    /// including panics. On failure the verdict tells the caller what to
    /// serve instead.
    pub fn try_acquire(
        &self,
        now: NaiveDateTime,
        latest_created_at: Option<NaiveDateTime>,
    ) -> Result<GateGuard<'_>, GateVerdict> {
        let decision = self.lock.try_begin(now, self.cooldown, &|| {
            self.generation_due(now, latest_created_at)
        });
        match decision {
            LockDecision::Acquired => {
                debug!(logical_date = %self.logical_date(now), "generation gate acquired");
                Ok(GateGuard { lock: &*self.lock })
            }
            LockDecision::InFlight => Err(GateVerdict::BlockedInFlight),
            LockDecision::CoolingDown | LockDecision::Declined => {
                Err(GateVerdict::ReturnExisting)
            }
        }
    }
}

/// Scoped ownership of the single-flight slot.
///
/// Releases the slot and records the attempt timestamp when dropped.
pub struct GateGuard<'a> {
    lock: &'a dyn GateLock,
}

impl std::fmt::Debug for GateGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateGuard").finish_non_exhaustive()
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(chrono::Local::now().naive_local());
    }
}
