use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use super::client_ip::client_ip;
use super::middleware::RequestStart;
use crate::models::{unix_now, NewClick};
use crate::registry::{is_valid_slug, LinkRegistry};
use crate::storage::Storage;

/// Longest header value kept on a click row
const MAX_HEADER_LEN: usize = 512;

pub struct RedirectState {
    pub registry: Arc<LinkRegistry>,
    pub storage: Arc<dyn Storage>,
}

/// Follow a tracking link: record the click, then send the visitor to the landing page
pub async fn follow_link(
    State(state): State<Arc<RedirectState>>,
    Path(slug): Path<String>,
    Extension(RequestStart(request_start)): Extension<RequestStart>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    if !is_valid_slug(&slug) {
        return (StatusCode::NOT_FOUND, "Link not found").into_response();
    }

    let link = match state.registry.resolve(&slug).await {
        Ok(Some(link)) => link,
        Ok(None) => return (StatusCode::NOT_FOUND, "Link not found").into_response(),
        Err(e) => {
            tracing::error!(slug = %slug, error = %e, "Failed to resolve slug");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
        }
    };

    if !link.is_active() {
        return (StatusCode::GONE, "This link has been deactivated").into_response();
    }

    let click = NewClick {
        tracking_link_id: link.id,
        clicked_at: unix_now(),
        ip: Some(client_ip(&headers, addr).to_string()),
        user_agent: header_text(&headers, header::USER_AGENT),
        referer: header_text(&headers, header::REFERER),
    };

    if let Err(err) = state.storage.record_clicks(std::slice::from_ref(&click)).await {
        tracing::warn!(slug = %slug, error = %err, "Failed to record click");
    }

    tracing::debug!(
        slug = %slug,
        elapsed_us = request_start.elapsed().as_micros() as u64,
        "Redirecting"
    );

    (
        StatusCode::FOUND,
        [
            (header::LOCATION, link.final_url),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
    )
        .into_response()
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.chars().take(MAX_HEADER_LEN).collect())
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: &'static str,
    }

    Json(HealthResponse { status: "OK" })
}
