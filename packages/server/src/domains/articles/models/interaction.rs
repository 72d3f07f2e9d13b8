use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// Per-user read state for an article.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserInteraction {
    pub id: i64,
    pub user_id: i64,
    pub article_id: String,
    pub has_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserInteraction {
    /// Mark an article read for a user. Idempotent: repeats keep the first
    /// `read_at`.
    pub async fn mark_read(user_id: i64, article_id: &str, pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO user_article_interactions (user_id, article_id, has_read, read_at)
            VALUES ($1, $2, TRUE, now())
            ON CONFLICT (user_id, article_id)
            DO UPDATE SET has_read = TRUE, read_at = COALESCE(user_article_interactions.read_at, now())
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(article_id)
        .fetch_one(pool)
        .await
    }

    /// Ids of every article this user has read.
    pub async fn read_ids(user_id: i64, pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT article_id FROM user_article_interactions WHERE user_id = $1 AND has_read",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

/// Latest rewrite per article. One live record per article id, newest
/// rewrite wins; powers the global "rewritten by a reader" badge.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRecord {
    pub id: i64,
    pub article_id: String,
    pub rewritten_by_user_id: i64,
    pub rewritten_at: DateTime<Utc>,
}

impl RewriteRecord {
    pub async fn upsert(article_id: &str, user_id: i64, pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO article_rewrites (article_id, rewritten_by_user_id, rewritten_at)
            VALUES ($1, $2, now())
            ON CONFLICT (article_id)
            DO UPDATE SET rewritten_by_user_id = $2, rewritten_at = now()
            RETURNING *
            "#,
        )
        .bind(article_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Ids of every rewritten article.
    pub async fn rewritten_ids(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT article_id FROM article_rewrites")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
