use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    config::ServerConfig,
    report,
    scanner::{self, now_rfc3339},
};

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<ServerConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ScanRequest {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExploitRequest {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub exploit: Option<String>,
    #[serde(default)]
    pub attack: Option<String>,
    #[serde(default)]
    pub scan_output: Option<String>,
}

/// Assemble the full application router: API routes plus the static UI.
pub fn build_router(cfg: ServerConfig) -> Router {
    let state = AppState { cfg: Arc::new(cfg) };
    let static_svc = ServeDir::new(&state.cfg.ui_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/scan", post(post_scan))
        .route("/exploit", post(post_exploit))
        .route("/health", get(get_health))
        .with_state(state)
        .fallback_service(static_svc)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(bind: &str, cfg: ServerConfig) -> Result<()> {
    let app = build_router(cfg);
    tracing::info!(bind, "serving lab scan API");
    axum::serve(tokio::net::TcpListener::bind(bind).await?, app).await?;
    Ok(())
}

async fn get_health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "time": now_rfc3339() }))
}

async fn post_scan(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> impl IntoResponse {
    if let Err(rejection) = check_api_key(&app.cfg, &headers) {
        return rejection;
    }
    // A missing or malformed body is treated like an empty one.
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let target = match pick_target(req.ip.as_deref(), req.target.as_deref()) {
        Some(t) => t,
        None => return missing_target(),
    };

    let session = scanner::run_scan_session(&app.cfg.scan, &target).await;
    tracing::info!(
        scan_id = %session.scan_id,
        host = %session.target,
        attempts = session.diagnostics.attempts.len(),
        timed_out = session.timed_out,
        "scan session complete"
    );
    (StatusCode::OK, Json(session)).into_response()
}

async fn post_exploit(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ExploitRequest>, JsonRejection>,
) -> impl IntoResponse {
    if let Err(rejection) = check_api_key(&app.cfg, &headers) {
        return rejection;
    }
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let target = match pick_target(req.target.as_deref(), req.ip.as_deref()) {
        Some(t) => t,
        None => return missing_target(),
    };
    let exploit_key = req
        .exploit
        .or(req.attack)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "simulated_exploit".to_string());
    let scan_output = req.scan_output.unwrap_or_default();

    let report = report::build_report(&target, &exploit_key, &scan_output);
    (StatusCode::OK, Json(report)).into_response()
}

/// First non-blank of the two aliases, trimmed.
fn pick_target(first: Option<&str>, second: Option<&str>) -> Option<String> {
    [first, second]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

fn check_api_key(cfg: &ServerConfig, headers: &HeaderMap) -> Result<(), axum::response::Response> {
    let Some(expected) = cfg.api_key.as_deref() else {
        return Ok(());
    };
    let presented = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if presented == expected {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response())
    }
}

fn missing_target() -> axum::response::Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing_target" }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_target_prefers_first_alias_and_trims() {
        assert_eq!(
            pick_target(Some("  10.0.0.5 "), Some("other")),
            Some("10.0.0.5".to_string())
        );
        assert_eq!(pick_target(None, Some("host")), Some("host".to_string()));
        assert_eq!(
            pick_target(Some("   "), Some("host")),
            Some("host".to_string())
        );
        assert_eq!(pick_target(Some("   "), None), None);
        assert_eq!(pick_target(None, None), None);
    }
}
