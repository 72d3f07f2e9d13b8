use chrono::{NaiveDateTime, Timelike};

/// How many of the freshest feed entries are eligible for selection.
const SELECTION_WINDOW: usize = 10;

/// Pick a candidate index from the top of the feed, varying by minute.
///
/// Deterministic for a given wall-clock minute, so a burst of concurrent
/// requests converges on the same topic. Returns `None` for an empty feed.
pub fn pick_index(now: NaiveDateTime, candidate_count: usize) -> Option<usize> {
    if candidate_count == 0 {
        return None;
    }
    let seed = (now.hour() * 60 + now.minute()) as usize;
    Some(seed % candidate_count.min(SELECTION_WINDOW))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_empty_feed_yields_none() {
        assert_eq!(pick_index(at(9, 30), 0), None);
    }

    #[test]
    fn test_index_within_window() {
        for count in [1, 3, 10, 50] {
            let idx = pick_index(at(23, 59), count).unwrap();
            assert!(idx < count.min(10));
        }
    }

    #[test]
    fn test_stable_within_a_minute() {
        let a = at(9, 30).with_second(5).unwrap();
        let b = at(9, 30).with_second(55).unwrap();
        assert_eq!(pick_index(a, 25), pick_index(b, 25));
    }

    #[test]
    fn test_varies_across_minutes() {
        assert_ne!(pick_index(at(9, 30), 10), pick_index(at(9, 31), 10));
    }

    #[test]
    fn test_single_candidate_always_selected() {
        assert_eq!(pick_index(at(17, 45), 1), Some(0));
    }
}
