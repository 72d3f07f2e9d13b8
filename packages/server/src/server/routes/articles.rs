// Article API routes

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domains::articles::error::ArticleError;
use crate::domains::articles::models::{Article, RewriteRecord, UserInteraction};
use crate::domains::articles::service;
use crate::server::app::AppState;

const DEFAULT_ARCHIVE_LIMIT: i64 = 30;
const MAX_ARCHIVE_LIMIT: i64 = 100;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

fn error_response(err: ArticleError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        ArticleError::ImmutableArticle { .. } => StatusCode::CONFLICT,
        ArticleError::NotFound { .. } => StatusCode::NOT_FOUND,
        ArticleError::Generation(_) => StatusCode::BAD_GATEWAY,
        ArticleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "Request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }),
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyArticleResponse {
    pub article: Option<Article>,
    pub seconds_until_reset: i64,
}

/// GET /api/article
///
/// The daily article for the current moment. May trigger a generation when
/// one is due; otherwise serves the latest persisted article. `article` is
/// null when nothing exists yet and generation is impossible.
pub async fn get_article_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<DailyArticleResponse>, (StatusCode, Json<ErrorResponse>)> {
    let article = service::get_daily_article(&state.deps, false)
        .await
        .map_err(error_response)?;
    let seconds_until_reset = state
        .deps
        .gate
        .seconds_until_reset(Local::now().naive_local());
    Ok(Json(DailyArticleResponse {
        article,
        seconds_until_reset,
    }))
}

#[derive(Deserialize)]
pub struct ArchiveParams {
    pub limit: Option<i64>,
}

/// GET /api/archive?limit=30
pub async fn get_archive_handler(
    Extension(state): Extension<AppState>,
    Query(params): Query<ArchiveParams>,
) -> Result<Json<Vec<Article>>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_ARCHIVE_LIMIT)
        .clamp(1, MAX_ARCHIVE_LIMIT);
    let articles = service::get_archive(&state.deps, limit)
        .await
        .map_err(error_response)?;
    Ok(Json(articles))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRequest {
    pub date: NaiveDate,
    pub user_id: i64,
}

#[derive(Serialize)]
pub struct RewriteResponse {
    pub success: bool,
    pub article: Article,
}

/// POST /api/rewrite
///
/// Regenerates a fallback article with the real backend. 409 when the
/// article is AI-generated (immutable), 404 when no article exists for the
/// date.
pub async fn rewrite_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<RewriteRequest>,
) -> Result<Json<RewriteResponse>, (StatusCode, Json<ErrorResponse>)> {
    let article = service::rewrite_article(&state.deps, request.date, request.user_id)
        .await
        .map_err(error_response)?;
    Ok(Json(RewriteResponse {
        success: true,
        article,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub user_id: i64,
    pub article_id: String,
}

/// POST /api/articles/mark-read
pub async fn mark_read_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<UserInteraction>, (StatusCode, Json<ErrorResponse>)> {
    let interaction =
        UserInteraction::mark_read(request.user_id, &request.article_id, &state.deps.db_pool)
            .await
            .map_err(|e| error_response(ArticleError::Store(e)))?;
    Ok(Json(interaction))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadArticlesParams {
    pub user_id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadArticlesResponse {
    pub article_ids: Vec<String>,
}

/// GET /api/articles/read?userId=
pub async fn read_articles_handler(
    Extension(state): Extension<AppState>,
    Query(params): Query<ReadArticlesParams>,
) -> Result<Json<ReadArticlesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let article_ids = UserInteraction::read_ids(params.user_id, &state.deps.db_pool)
        .await
        .map_err(|e| error_response(ArticleError::Store(e)))?;
    Ok(Json(ReadArticlesResponse { article_ids }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewrittenArticlesResponse {
    pub article_ids: Vec<String>,
}

/// GET /api/articles/rewritten
///
/// Ids of every article carrying the "rewritten by a reader" badge.
pub async fn rewritten_articles_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<RewrittenArticlesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let article_ids = RewriteRecord::rewritten_ids(&state.deps.db_pool)
        .await
        .map_err(|e| error_response(ArticleError::Store(e)))?;
    Ok(Json(RewrittenArticlesResponse { article_ids }))
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

/// GET /api/check-groq
///
/// Availability probe for the generation backend. Fail-closed: any doubt
/// reports unavailable.
pub async fn check_groq_handler(
    Extension(state): Extension<AppState>,
) -> Json<AvailabilityResponse> {
    let available = state.deps.generator.check_available().await;
    Json(AvailabilityResponse { available })
}

#[derive(Serialize)]
pub struct TestGenerateResponse {
    pub article: Article,
    pub persisted: bool,
}

/// POST /api/test-generate
///
/// Debug entry point: runs the full generation pipeline and returns the
/// result without persisting it.
pub async fn test_generate_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<TestGenerateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let article = service::get_daily_article(&state.deps, true)
        .await
        .map_err(error_response)?;
    match article {
        Some(article) => Ok(Json(TestGenerateResponse {
            article,
            persisted: false,
        })),
        None => Err(error_response(ArticleError::Generation(
            crate::domains::articles::error::GenerateError::EmptyResponse,
        ))),
    }
}
