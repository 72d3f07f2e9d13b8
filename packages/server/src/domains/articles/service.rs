// Orchestration: gate evaluation, generation, fallback, persistence
//
// The one writer of the daily_articles table besides the rewrite path.
// Everything network-facing goes through the kernel traits so the flow is
// testable with fakes.

use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use sqlx::types::Json;
use tracing::{info, warn};

use crate::domains::articles::error::{ArticleError, GenerateError};
use crate::domains::articles::fallback;
use crate::domains::articles::generator;
use crate::domains::articles::models::{
    Article, ArticleDraft, ExternalLink, RewritePatch, RewriteRecord,
};
use crate::domains::articles::selection;
use crate::kernel::traits::TopicCandidate;
use crate::kernel::ServerDeps;

const CATEGORY: &str = "psychology";
const BROWSE_MORE_URL: &str = "https://www.sciencedaily.com/news/mind_brain/psychology/";

/// The daily article for the current moment.
///
/// Evaluates the generation gate, generates (or synthesizes) when due, and
/// otherwise serves the latest persisted article. Safe to call from
/// concurrent page renders. `force` bypasses the gate and returns an
/// unpersisted preview; forced results never become the canonical latest.
pub async fn get_daily_article(
    deps: &ServerDeps,
    force: bool,
) -> Result<Option<Article>, ArticleError> {
    let now = Local::now().naive_local();
    let latest = Article::latest(&deps.db_pool).await?;

    if force {
        let preview = generate_preview(deps, now).await?;
        return Ok(Some(preview));
    }

    let latest_created = latest.as_ref().map(local_naive);
    let guard = match deps.gate.try_acquire(now, latest_created) {
        Ok(guard) => guard,
        Err(verdict) => {
            info!(?verdict, "Serving existing article");
            return Ok(latest);
        }
    };

    let logical_date = deps.gate.logical_date(now);
    info!(%logical_date, "Generating new daily article");

    // Slot stays held through probe, fetch, and generation; concurrent
    // evaluations are told BLOCKED_IN_FLIGHT meanwhile.
    let available = deps.generator.check_available().await;

    let candidates = match deps.topics.fetch_candidates().await {
        Ok(candidates) => candidates,
        Err(err) => {
            warn!(error = %err, "Topic feed fetch failed, serving latest");
            drop(guard);
            return Ok(latest);
        }
    };
    let Some(index) = selection::pick_index(now, candidates.len()) else {
        warn!("Topic feed empty, serving latest");
        drop(guard);
        return Ok(latest);
    };
    let topic = &candidates[index];
    info!(index, title = %topic.title, "Selected topic");

    let draft = build_draft(deps, topic, logical_date, now, available).await;
    let article = Article::insert(draft, &deps.db_pool).await?;
    info!(id = %article.id, fallback = article.is_fallback_content, "Article persisted");
    drop(guard);
    Ok(Some(article))
}

/// Produce the draft for a selected topic: AI generation when the backend
/// looks available, fallback synthesis otherwise or on any classified
/// generation failure.
async fn build_draft(
    deps: &ServerDeps,
    topic: &TopicCandidate,
    logical_date: NaiveDate,
    now: NaiveDateTime,
    backend_available: bool,
) -> ArticleDraft {
    let (body, is_fallback, generation_error) = if !backend_available {
        info!("Backend unavailable, synthesizing fallback content");
        let fb = fallback::synthesize(&topic.description, topic.published_at);
        (
            generator::GeneratedBody {
                content: fb.content,
                key_insights: fb.key_insights,
                key_concepts: fb.key_concepts,
                daily_practice: fb.daily_practice,
            },
            true,
            Some("generation backend unavailable".to_string()),
        )
    } else {
        match generator::generate_article(deps.generator.as_ref(), topic).await {
            Ok(body) => (body, false, None),
            Err(err) => {
                warn!(code = err.code(), error = %err, "Generation failed, synthesizing fallback");
                let fb = fallback::synthesize(&topic.description, topic.published_at);
                (
                    generator::GeneratedBody {
                        content: fb.content,
                        key_insights: fb.key_insights,
                        key_concepts: fb.key_concepts,
                        daily_practice: fb.daily_practice,
                    },
                    true,
                    Some(err.to_string()),
                )
            }
        }
    };

    ArticleDraft {
        id: Article::derive_id(logical_date, &topic.title, now),
        date: logical_date,
        title: topic.title.clone(),
        reading_time: Article::estimate_reading_time(&body.content),
        content: body.content,
        category: CATEGORY.to_string(),
        key_insights: body.key_insights,
        key_concepts: body.key_concepts,
        daily_practice: body.daily_practice,
        links: topic_links(topic),
        source_url: Some(topic.link.clone()),
        is_fallback_content: is_fallback,
        generation_error,
    }
}

/// Test-only preview: full generation pipeline, nothing persisted.
async fn generate_preview(
    deps: &ServerDeps,
    now: NaiveDateTime,
) -> Result<Article, ArticleError> {
    let candidates = deps
        .topics
        .fetch_candidates()
        .await
        .map_err(|err| {
            ArticleError::Generation(GenerateError::Network {
                detail: format!("topic feed unavailable: {err}"),
            })
        })?;
    let Some(index) = selection::pick_index(now, candidates.len()) else {
        return Err(ArticleError::Generation(GenerateError::BackendUnavailable {
            detail: "no topic candidates available".to_string(),
        }));
    };
    let topic = &candidates[index];
    info!(title = %topic.title, "Generating unpersisted preview");

    let body = generator::generate_article(deps.generator.as_ref(), topic).await?;
    let logical_date = deps.gate.logical_date(now);

    Ok(Article {
        id: Article::derive_id(logical_date, &topic.title, now),
        date: logical_date,
        title: topic.title.clone(),
        reading_time: Article::estimate_reading_time(&body.content),
        content: body.content,
        category: CATEGORY.to_string(),
        key_insights: Json(body.key_insights),
        key_concepts: Json(body.key_concepts),
        daily_practice: Json(body.daily_practice),
        links: Json(topic_links(topic)),
        source_url: Some(topic.link.clone()),
        rewrite_count: 0,
        last_rewritten_at: None,
        is_fallback_content: false,
        generation_error: None,
        created_at: Utc::now(),
    })
}

/// Regenerate a fallback article with the real backend.
///
/// Fails with ImmutableArticle on AI-generated rows and NotFound when no
/// row exists for the date. The final update is conditional, so a racing
/// rewrite or fresh generation loses cleanly.
pub async fn rewrite_article(
    deps: &ServerDeps,
    date: NaiveDate,
    user_id: i64,
) -> Result<Article, ArticleError> {
    let existing = Article::by_date(date, &deps.db_pool)
        .await?
        .ok_or(ArticleError::NotFound { date })?;

    if !existing.is_fallback_content {
        return Err(ArticleError::ImmutableArticle { date });
    }

    info!(id = %existing.id, %date, user_id, "Rewriting fallback article");

    let source_url = existing.source_url.as_deref().unwrap_or("");
    let body = generator::rewrite_article(
        deps.generator.as_ref(),
        &existing.title,
        &existing.content,
        source_url,
    )
    .await?;

    let patch = RewritePatch {
        reading_time: Article::estimate_reading_time(&body.content),
        content: body.content,
        key_insights: body.key_insights,
        key_concepts: body.key_concepts,
        daily_practice: body.daily_practice,
    };

    let updated = Article::rewrite_fallback(date, &patch, &deps.db_pool).await?;
    let updated = match updated {
        Some(article) => article,
        // Lost a race: the row flipped to AI-generated (or vanished)
        // between the precheck and the conditional update.
        None => match Article::by_date(date, &deps.db_pool).await? {
            Some(_) => return Err(ArticleError::ImmutableArticle { date }),
            None => return Err(ArticleError::NotFound { date }),
        },
    };

    RewriteRecord::upsert(&updated.id, user_id, &deps.db_pool).await?;
    info!(id = %updated.id, rewrite_count = updated.rewrite_count, "Rewrite persisted");
    Ok(updated)
}

/// Archive listing, newest first.
pub async fn get_archive(deps: &ServerDeps, limit: i64) -> Result<Vec<Article>, ArticleError> {
    Ok(Article::list(limit, &deps.db_pool).await?)
}

fn topic_links(topic: &TopicCandidate) -> Vec<ExternalLink> {
    vec![
        ExternalLink {
            title: "Read Original Research on ScienceDaily".to_string(),
            url: topic.link.clone(),
            description: Some(
                "Full article with complete research details and sources".to_string(),
            ),
        },
        ExternalLink {
            title: "ScienceDaily Psychology News".to_string(),
            url: BROWSE_MORE_URL.to_string(),
            description: Some("Browse more psychology research news".to_string()),
        },
    ]
}

fn local_naive(article: &Article) -> NaiveDateTime {
    article.created_at.with_timezone(&Local).naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::articles::gate::{GenerationGate, ResetBoundary};
    use crate::kernel::traits::{BaseGenerator, BaseTopicSource};
    use async_trait::async_trait;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeGenerator {
        available: bool,
        response: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl FakeGenerator {
        fn succeeding(content: &str) -> Self {
            Self {
                available: true,
                response: Ok(content.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                available: true,
                response: Err(()),
                calls: AtomicUsize::new(0),
            }
        }

        fn unavailable() -> Self {
            Self {
                available: false,
                response: Err(()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BaseGenerator for FakeGenerator {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _max_tokens: u32,
        ) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response
                .clone()
                .map_err(|_| GenerateError::BackendUnavailable {
                    detail: "injected failure".to_string(),
                })
        }

        async fn check_available(&self) -> bool {
            self.available
        }
    }

    struct FakeTopics {
        candidates: Vec<TopicCandidate>,
    }

    #[async_trait]
    impl BaseTopicSource for FakeTopics {
        async fn fetch_candidates(&self) -> anyhow::Result<Vec<TopicCandidate>> {
            Ok(self.candidates.clone())
        }
    }

    fn topic() -> TopicCandidate {
        TopicCandidate {
            title: "How Sleep Shapes Memory".to_string(),
            link: "https://www.sciencedaily.com/releases/2025/03/sleep.htm".to_string(),
            description: "Researchers found that sleep consolidates memory.".to_string(),
            published_at: None,
        }
    }

    fn deps_with(generator: Arc<FakeGenerator>) -> ServerDeps {
        // connect_lazy: no database needed until a query actually runs
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        ServerDeps {
            db_pool: pool,
            generator,
            topics: Arc::new(FakeTopics {
                candidates: vec![topic()],
            }),
            gate: Arc::new(GenerationGate::new(
                ResetBoundary::new(0, 0),
                std::time::Duration::from_secs(300),
            )),
        }
    }

    fn noon() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_unavailable_backend_never_calls_generator() {
        let generator = Arc::new(FakeGenerator::unavailable());
        let deps = deps_with(generator.clone());
        let date = deps.gate.logical_date(noon());

        let draft = build_draft(&deps, &topic(), date, noon(), false).await;

        assert!(draft.is_fallback_content);
        assert!(draft.generation_error.is_some());
        assert!(!draft.content.is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back() {
        let generator = Arc::new(FakeGenerator::failing());
        let deps = deps_with(generator.clone());
        let date = deps.gate.logical_date(noon());

        let draft = build_draft(&deps, &topic(), date, noon(), true).await;

        assert!(draft.is_fallback_content);
        assert!(draft
            .generation_error
            .as_deref()
            .unwrap()
            .contains("injected failure"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert!(draft.reading_time >= 2);
    }

    #[tokio::test]
    async fn test_successful_generation_is_not_fallback() {
        let raw = "**The Discovery**\nSleep helps memory.\n\nMore prose here.";
        let generator = Arc::new(FakeGenerator::succeeding(raw));
        let deps = deps_with(generator.clone());
        let date = deps.gate.logical_date(noon());

        let draft = build_draft(&deps, &topic(), date, noon(), true).await;

        assert!(!draft.is_fallback_content);
        assert!(draft.generation_error.is_none());
        assert!(draft.content.contains("**The Discovery**"));
        assert_eq!(draft.title, "How Sleep Shapes Memory");
        assert_eq!(draft.source_url.as_deref(), Some(topic().link.as_str()));
        assert_eq!(draft.links.len(), 2);
    }

    // =========================================================================
    // Database tests
    // =========================================================================

    async fn db_deps(generator: Arc<FakeGenerator>) -> ServerDeps {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new().connect(&url).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        let mut deps = deps_with(generator);
        deps.db_pool = pool;
        deps
    }

    fn draft_for(date: chrono::NaiveDate, is_fallback: bool) -> ArticleDraft {
        ArticleDraft {
            id: Article::derive_id(date, "Test Topic", Local::now().naive_local()),
            date,
            title: "Test Topic".to_string(),
            content: "Some content.\n\nMore content.".to_string(),
            category: CATEGORY.to_string(),
            reading_time: 2,
            key_insights: vec!["an insight".to_string()],
            key_concepts: vec![],
            daily_practice: vec!["a practice".to_string()],
            links: vec![],
            source_url: Some("https://example.com".to_string()),
            is_fallback_content: is_fallback,
            generation_error: is_fallback.then(|| "backend down".to_string()),
        }
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_rewrite_rejects_ai_generated_article() {
        let deps = db_deps(Arc::new(FakeGenerator::succeeding("new content"))).await;
        let date = chrono::NaiveDate::from_ymd_opt(1991, 1, 1).unwrap();
        let inserted = Article::insert(draft_for(date, false), &deps.db_pool)
            .await
            .unwrap();

        let err = rewrite_article(&deps, date, 1).await.unwrap_err();
        assert!(matches!(err, ArticleError::ImmutableArticle { .. }));

        // Content bytes unchanged
        let after = Article::by_date(date, &deps.db_pool).await.unwrap().unwrap();
        assert_eq!(after.content, inserted.content);
        assert_eq!(after.rewrite_count, 0);
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_rewrite_fallback_flips_provenance() {
        let raw = "**Rewritten**\n\nFresh AI prose for the same topic.";
        let deps = db_deps(Arc::new(FakeGenerator::succeeding(raw))).await;
        let date = chrono::NaiveDate::from_ymd_opt(1991, 2, 2).unwrap();
        Article::insert(draft_for(date, true), &deps.db_pool)
            .await
            .unwrap();

        let rewritten = rewrite_article(&deps, date, 42).await.unwrap();

        assert!(!rewritten.is_fallback_content);
        assert_eq!(rewritten.rewrite_count, 1);
        assert!(rewritten.generation_error.is_none());
        assert!(rewritten.last_rewritten_at.is_some());
        assert!(rewritten.content.contains("Fresh AI prose"));

        let records = RewriteRecord::rewritten_ids(&deps.db_pool).await.unwrap();
        assert!(records.contains(&rewritten.id));

        // A second rewrite now hits the immutability rule
        let err = rewrite_article(&deps, date, 42).await.unwrap_err();
        assert!(matches!(err, ArticleError::ImmutableArticle { .. }));
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_rewrite_unknown_date_is_not_found() {
        let deps = db_deps(Arc::new(FakeGenerator::succeeding("x"))).await;
        let date = chrono::NaiveDate::from_ymd_opt(1970, 6, 15).unwrap();
        let err = rewrite_article(&deps, date, 1).await.unwrap_err();
        assert!(matches!(err, ArticleError::NotFound { .. }));
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_mark_read_is_idempotent() {
        use crate::domains::articles::models::UserInteraction;

        let deps = db_deps(Arc::new(FakeGenerator::succeeding("x"))).await;
        let date = chrono::NaiveDate::from_ymd_opt(1991, 3, 3).unwrap();
        let article = Article::insert(draft_for(date, true), &deps.db_pool)
            .await
            .unwrap();

        let first = UserInteraction::mark_read(7, &article.id, &deps.db_pool)
            .await
            .unwrap();
        let second = UserInteraction::mark_read(7, &article.id, &deps.db_pool)
            .await
            .unwrap();

        assert!(first.has_read && second.has_read);
        assert_eq!(first.id, second.id);
        assert_eq!(first.read_at, second.read_at);
    }
}
