use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::core::{has_changed, ContentFetcher, MonitoringScheduler};
use crate::error::Result;

/// Shared state behind the trigger surface
pub struct AppState {
    fetcher: Arc<ContentFetcher>,
    scheduler: Arc<MonitoringScheduler>,
}

impl AppState {
    pub fn new(fetcher: Arc<ContentFetcher>, scheduler: Arc<MonitoringScheduler>) -> Self {
        Self { fetcher, scheduler }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    pub url: String,
    pub last_hash: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResponse {
    pub changed: bool,
    pub new_hash: String,
    pub checked_at: DateTime<Utc>,
    /// Included only when the content changed or no prior hash was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/crawl", post(crawl))
        .route("/sweep", post(sweep))
        .with_state(state)
}

/// Synchronous single-URL check: fetch, fingerprint, compare against the
/// caller-provided hash.
async fn crawl(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CrawlRequest>,
) -> std::result::Result<Json<CrawlResponse>, (StatusCode, Json<serde_json::Value>)> {
    match state.fetcher.fetch(&request.url).await {
        Ok(fetched) => {
            let changed = has_changed(&fetched.hash, request.last_hash.as_deref());
            let text = if changed || request.last_hash.is_none() {
                Some(fetched.text)
            } else {
                None
            };
            Ok(Json(CrawlResponse {
                changed,
                new_hash: fetched.hash,
                checked_at: Utc::now(),
                text,
            }))
        }
        Err(e) => {
            error!(url = %request.url, error = %e, "Manual crawl failed");
            // Generic failure; fetch details stay in the logs
            Err((
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": "failed to check url" })),
            ))
        }
    }
}

/// Administrative trigger for the full sweep; same reentrancy guard as
/// the daily timer.
async fn sweep(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.scheduler.run_tick().await {
        Ok(Some(report)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "startedAt": report.started_at,
                "changed": report.changed(),
                "unchanged": report.unchanged(),
                "skipped": report.skipped(),
                "failed": report.failed(),
            })),
        ),
        Ok(None) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "status": "sweep already in progress" })),
        ),
        Err(e) => {
            error!(error = %e, "Triggered sweep failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "sweep failed" })),
            )
        }
    }
}

pub async fn serve(state: Arc<AppState>, bind_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("🌐 Trigger surface listening on {}", bind_addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_request_accepts_camel_case() {
        let request: CrawlRequest =
            serde_json::from_str(r#"{"url": "https://example.com", "lastHash": "abc"}"#).unwrap();
        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.last_hash.as_deref(), Some("abc"));
    }

    #[test]
    fn test_crawl_response_omits_text_when_absent() {
        let response = CrawlResponse {
            changed: false,
            new_hash: "abc".to_string(),
            checked_at: Utc::now(),
            text: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("text").is_none());
        assert_eq!(json["newHash"], "abc");
    }
}
