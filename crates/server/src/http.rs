//! HTTP surface over the orchestrator.
//!
//! Routes (each also answers with a trailing slash):
//! - `GET /colabBook?id_book=<id>&amount=<n>`
//! - `GET /recommendation?id_book=<id>[&id_book=<id>...]`
//! - `GET /colabUser?user_id=<id>&amount=<n>`
//! - `GET /`

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use data_loader::{ItemId, RowRef, UserId};

use crate::error::RecommendError;
use crate::orchestrator::{BookSummary, RecommendationOrchestrator, UserRecommendations};

type Params = Query<Vec<(String, String)>>;

#[derive(Debug, Serialize)]
struct RelatedRows {
    recommendations: Vec<RowRef>,
}

impl RecommendError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BookNotFound(_) | Self::ItemNotFound(_) | Self::UnknownUser(_) | Self::UnindexedQuery(_) => {
                StatusCode::NOT_FOUND
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RetrievalUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Model(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RecommendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Build the router with request tracing.
pub fn router(orchestrator: RecommendationOrchestrator) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/colabBook", get(colab_book))
        .route("/colabBook/", get(colab_book))
        .route("/recommendation", get(recommendation))
        .route("/recommendation/", get(recommendation))
        .route("/colabUser", get(colab_user))
        .route("/colabUser/", get(colab_user))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

/// Serve until the process is stopped.
pub async fn serve(addr: SocketAddr, orchestrator: RecommendationOrchestrator) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Binding {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, router(orchestrator))
        .await
        .context("HTTP server failed")
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Hello World" }))
}

async fn colab_book(
    State(orchestrator): State<RecommendationOrchestrator>,
    Query(params): Params,
) -> Result<Json<Vec<BookSummary>>, RecommendError> {
    let id = ItemId(required(&params, "id_book")?);
    let amount = required(&params, "amount")?;
    Ok(Json(orchestrator.similar_books(id, amount).await?))
}

/// Rows related to every `id_book` seed.
///
/// 400 when no id is given or one does not parse, 404 when a seed has no
/// document in the vector index, 503 when the index is empty or unreadable.
async fn recommendation(
    State(orchestrator): State<RecommendationOrchestrator>,
    Query(params): Params,
) -> Result<Json<RelatedRows>, RecommendError> {
    let ids = params
        .iter()
        .filter(|(key, _)| key == "id_book")
        .map(|(_, value)| parse("id_book", value).map(ItemId))
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err(RecommendError::BadRequest("missing query parameter 'id_book'".to_string()));
    }

    let recommendations = orchestrator.related_rows(&ids).await?;
    Ok(Json(RelatedRows { recommendations }))
}

async fn colab_user(
    State(orchestrator): State<RecommendationOrchestrator>,
    Query(params): Params,
) -> Result<Json<UserRecommendations>, RecommendError> {
    let user_id: String = required(&params, "user_id")?;
    let amount = required(&params, "amount")?;
    Ok(Json(orchestrator.recommend_for_user(UserId::new(user_id), amount).await?))
}

/// First value of a query parameter
fn required<T: FromStr>(params: &[(String, String)], name: &str) -> Result<T, RecommendError>
where
    T::Err: std::fmt::Display,
{
    let value = params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
        .ok_or_else(|| RecommendError::BadRequest(format!("missing query parameter '{}'", name)))?;
    parse(name, value)
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T, RecommendError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| RecommendError::BadRequest(format!("invalid '{}' value '{}': {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::test_support::{FakeIndex, IndexScoreModel, build_test_context, fake_index};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        router(RecommendationOrchestrator::new(
            build_test_context(),
            fake_index(),
            Arc::new(IndexScoreModel),
            ServiceConfig::default(),
        ))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_root() {
        let (status, body) = get_json(app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hello World");
    }

    #[tokio::test]
    async fn test_colab_book() {
        let (status, body) = get_json(app(), "/colabBook/?id_book=1&amount=2").await;
        assert_eq!(status, StatusCode::OK);

        let books = body.as_array().unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0]["title"], "Emma");
        assert_eq!(books[0]["authors"][0], "Jane Austen");
        assert_eq!(books[0]["image"], "http://img/2");
        assert!(books[0].get("score").is_none());
    }

    #[tokio::test]
    async fn test_colab_book_unknown_id() {
        let (status, body) = get_json(app(), "/colabBook?id_book=999&amount=2").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("999"));
    }

    #[tokio::test]
    async fn test_colab_book_bad_params() {
        let (status, _) = get_json(app(), "/colabBook?id_book=abc&amount=2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get_json(app(), "/colabBook?id_book=1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("amount"));
    }

    #[tokio::test]
    async fn test_recommendation_repeated_ids() {
        let (status, body) = get_json(app(), "/recommendation?id_book=1&id_book=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recommendations"], json!([11, 12, 11]));
    }

    #[tokio::test]
    async fn test_recommendation_requires_ids() {
        let (status, _) = get_json(app(), "/recommendation/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recommendation_unindexed_seed() {
        let (status, body) = get_json(app(), "/recommendation?id_book=3").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("3"));
    }

    #[tokio::test]
    async fn test_recommendation_index_unavailable() {
        let app = router(RecommendationOrchestrator::new(
            build_test_context(),
            Arc::new(FakeIndex::default()),
            Arc::new(IndexScoreModel),
            ServiceConfig::default(),
        ));
        let (status, _) = get_json(app, "/recommendation?id_book=1").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_colab_user() {
        let (status, body) = get_json(app(), "/colabUser?user_id=alice&amount=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "alice");

        let recommended: Vec<&str> = body["recommended_books"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap())
            .collect();
        assert_eq!(recommended, vec!["Persuasion", "Ulysses"]);
        assert_eq!(body["top_books_user"][0]["title"], "Dune");
        assert_eq!(body["top_books_user"][0]["categories"][0], "Fiction");
    }

    #[tokio::test]
    async fn test_colab_user_unknown() {
        let (status, body) = get_json(app(), "/colabUser/?user_id=ghost&amount=5").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Unknown user: ghost");
    }

    #[test]
    fn test_status_mapping() {
        use std::time::Duration;

        let timeout = RecommendError::Timeout {
            operation: "vector search",
            timeout: Duration::from_secs(5),
        };
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            RecommendError::Internal("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(RecommendError::UnindexedQuery("3".to_string()).is_not_found());
    }
}
