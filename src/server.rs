//! The site's two HTTP endpoints: the visual-data proxy (so chart CSVs on
//! the storage host can be fetched without CORS trouble) and the newsletter
//! subscribe forwarder.

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Hosts the visual-data proxy will fetch from. HTTPS only.
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,
    #[serde(default = "default_newsletter_url")]
    pub newsletter_url: String,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_allowed_hosts() -> Vec<String> {
    vec!["tngxrcncslblrarjqtwn.supabase.co".to_string()]
}

fn default_newsletter_url() -> String {
    "https://buttondown.email/api/emails/embed-subscribe/northeastindata".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_hosts: default_allowed_hosts(),
            newsletter_url: default_newsletter_url(),
        }
    }
}

struct AppState {
    config: ServerConfig,
    http: reqwest::Client,
}

pub fn router(config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        config,
        http: reqwest::Client::new(),
    });
    Router::new()
        .route("/api/visual-data", get(visual_data))
        .route("/api/newsletter", post(newsletter))
        .with_state(state)
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let bind = config.bind.clone();
    let app = router(config);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(%bind, "serving");
    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct VisualDataQuery {
    url: Option<String>,
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message })),
    )
        .into_response()
}

/// Allow-listed passthrough for chart datasets. The upstream body and
/// content type are returned verbatim; the upstream status propagates on
/// failure.
async fn visual_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VisualDataQuery>,
) -> Response {
    let url_param = match query.url {
        Some(u) => u,
        None => return bad_request("Missing url"),
    };

    let target = match reqwest::Url::parse(&url_param) {
        Ok(t) => t,
        Err(_) => return bad_request("Invalid url"),
    };

    let host_allowed = target
        .host_str()
        .map(|h| state.config.allowed_hosts.iter().any(|a| a == h))
        .unwrap_or(false);
    if target.scheme() != "https" || !host_allowed {
        warn!(url = %url_param, "rejected proxy target");
        return bad_request("URL not allowed");
    }

    let upstream = match state.http.get(target).send().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "upstream fetch failed");
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Upstream fetch failed" })),
            )
                .into_response();
        }
    };

    let status = upstream.status();
    if !status.is_success() {
        let code =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        return (
            code,
            Json(json!({ "error": format!("Upstream fetch failed ({})", status.as_u16()) })),
        )
            .into_response();
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/csv; charset=utf-8")
        .to_string();

    match upstream.text().await {
        Ok(body) => (
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to read upstream body");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Upstream fetch failed" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubscribeRequest {
    email: Option<String>,
}

/// Forward a newsletter signup to the mailing-list embed endpoint as a
/// form post. 400 for a missing email, 502 when the provider declines,
/// 500 when the forward itself fails.
async fn newsletter(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubscribeRequest>,
) -> Response {
    let email = request.email.as_deref().unwrap_or("").trim().to_string();
    if email.is_empty() {
        return bad_request("Email is required.");
    }

    let result = state
        .http
        .post(&state.config.newsletter_url)
        .form(&[("email", email.as_str())])
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => (
            StatusCode::OK,
            Json(json!({ "message": "Thanks! Check your inbox to confirm." })),
        )
            .into_response(),
        Ok(response) => {
            warn!(status = %response.status(), "newsletter provider declined");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Unable to subscribe right now. Please try again." })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "newsletter forward failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Unable to subscribe right now. Please try again." })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: ServerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert!(!config.allowed_hosts.is_empty());
    }

    #[test]
    fn test_router_builds() {
        let _ = router(ServerConfig::default());
    }
}
