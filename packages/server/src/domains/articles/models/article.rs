use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

/// Words-per-minute basis for the derived reading time.
const WORDS_PER_MINUTE: usize = 200;

/// A glossary entry attached to an article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyConcept {
    pub term: String,
    pub detail: String,
}

/// An outbound reference attached to an article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExternalLink {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The durable unit of content.
///
/// `date` is the logical article day (shifted by the reset boundary), not
/// the creation instant; `created_at` is the persistence timestamp. Multiple
/// rows may share a `date`; the canonical "latest" article is strictly the
/// newest `created_at`. `id` is the only uniqueness guarantee.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    pub content: String,
    pub category: String,
    pub reading_time: i32,
    pub key_insights: Json<Vec<String>>,
    pub key_concepts: Json<Vec<KeyConcept>>,
    pub daily_practice: Json<Vec<String>>,
    pub links: Json<Vec<ExternalLink>>,
    pub source_url: Option<String>,
    pub rewrite_count: i32,
    pub last_rewritten_at: Option<DateTime<Utc>>,
    pub is_fallback_content: bool,
    pub generation_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for inserting a new article row.
#[derive(Debug, Clone)]
pub struct ArticleDraft {
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    pub content: String,
    pub category: String,
    pub reading_time: i32,
    pub key_insights: Vec<String>,
    pub key_concepts: Vec<KeyConcept>,
    pub daily_practice: Vec<String>,
    pub links: Vec<ExternalLink>,
    pub source_url: Option<String>,
    pub is_fallback_content: bool,
    pub generation_error: Option<String>,
}

/// Content fields replaced by a successful rewrite.
#[derive(Debug, Clone)]
pub struct RewritePatch {
    pub content: String,
    pub reading_time: i32,
    pub key_insights: Vec<String>,
    pub key_concepts: Vec<KeyConcept>,
    pub daily_practice: Vec<String>,
}

impl Article {
    /// Derive a globally unique article id from the logical date, a slug of
    /// the topic title, and the creation instant. Ids are never reused even
    /// when the same topic is regenerated on the same day.
    pub fn derive_id(date: NaiveDate, title: &str, created: NaiveDateTime) -> String {
        let slug: String = title
            .chars()
            .take(20)
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        format!(
            "sd-{}-{}-{:02}{:02}{:02}",
            date.format("%Y-%m-%d"),
            slug,
            created.hour(),
            created.minute(),
            created.second(),
        )
    }

    /// Reading time in minutes: word count over 200 wpm, never below 2.
    pub fn estimate_reading_time(text: &str) -> i32 {
        let words = text.split_whitespace().count();
        (words.div_ceil(WORDS_PER_MINUTE)).max(2) as i32
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Append a new article row. `date` is intentionally non-unique: every
    /// generation adds to the history, and "latest" is defined by
    /// `created_at` alone.
    pub async fn insert(draft: ArticleDraft, pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO daily_articles
                (id, date, title, content, category, reading_time,
                 key_insights, key_concepts, daily_practice, links,
                 source_url, is_fallback_content, generation_error)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&draft.id)
        .bind(draft.date)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(&draft.category)
        .bind(draft.reading_time)
        .bind(Json(&draft.key_insights))
        .bind(Json(&draft.key_concepts))
        .bind(Json(&draft.daily_practice))
        .bind(Json(&draft.links))
        .bind(&draft.source_url)
        .bind(draft.is_fallback_content)
        .bind(&draft.generation_error)
        .fetch_one(pool)
        .await
    }

    /// The most recently created article, if any.
    pub async fn latest(pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM daily_articles ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(pool)
        .await
    }

    /// The most recent article for a logical date (duplicates resolve to
    /// the newest row).
    pub async fn by_date(date: NaiveDate, pool: &PgPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM daily_articles WHERE date = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(date)
        .fetch_optional(pool)
        .await
    }

    /// Newest-first archive listing.
    pub async fn list(limit: i64, pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM daily_articles ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Conditionally rewrite the newest article for a date.
    ///
    /// Single statement, no separate read: the update only lands when the
    /// row is still fallback content, so a rewrite racing another rewrite
    /// (or a fresh AI generation) fails closed instead of clobbering an
    /// immutable article. Returns the updated row, or `None` when no
    /// fallback row matched.
    pub async fn rewrite_fallback(
        date: NaiveDate,
        patch: &RewritePatch,
        pool: &PgPool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE daily_articles SET
                content = $2,
                reading_time = $3,
                key_insights = $4,
                key_concepts = $5,
                daily_practice = $6,
                rewrite_count = rewrite_count + 1,
                last_rewritten_at = now(),
                is_fallback_content = FALSE,
                generation_error = NULL
            WHERE id = (
                SELECT id FROM daily_articles
                WHERE date = $1
                ORDER BY created_at DESC
                LIMIT 1
            )
            AND is_fallback_content = TRUE
            RETURNING *
            "#,
        )
        .bind(date)
        .bind(&patch.content)
        .bind(patch.reading_time)
        .bind(Json(&patch.key_insights))
        .bind(Json(&patch.key_concepts))
        .bind(Json(&patch.daily_practice))
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn when() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(9, 15, 30)
            .unwrap()
    }

    #[test]
    fn test_derive_id_shape() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let id = Article::derive_id(date, "How Sleep Shapes Memory Consolidation", when());
        assert_eq!(id, "sd-2025-03-10-HowSleepShapesMemor-091530");
    }

    #[test]
    fn test_derive_id_differs_across_regenerations() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let later = when() + chrono::TimeDelta::seconds(1);
        assert_ne!(
            Article::derive_id(date, "Same Topic", when()),
            Article::derive_id(date, "Same Topic", later)
        );
    }

    #[test]
    fn test_derive_id_strips_non_alphanumeric() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let id = Article::derive_id(date, "Mind & Body: 10%?", when());
        assert!(id.starts_with("sd-2025-03-10-MindBody10"));
    }

    #[test]
    fn test_reading_time_floor() {
        assert_eq!(Article::estimate_reading_time("a few words"), 2);
        assert_eq!(Article::estimate_reading_time(""), 2);
    }

    #[test]
    fn test_reading_time_scales_with_length() {
        let long = "word ".repeat(1000);
        assert_eq!(Article::estimate_reading_time(&long), 5);
        let odd = "word ".repeat(1001);
        assert_eq!(Article::estimate_reading_time(&odd), 6);
    }
}
