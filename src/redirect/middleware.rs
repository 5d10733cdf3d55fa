use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// When the redirect listener accepted the request
#[derive(Copy, Clone)]
pub struct RequestStart(pub Instant);

static SERVER_TIMING: HeaderName = HeaderName::from_static("server-timing");

/// Stamps the request start and reports total handling time as `Server-Timing`
pub async fn record_request_start(mut request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    request.extensions_mut().insert(RequestStart(start));

    let mut response = next.run(request).await;

    let millis = start.elapsed().as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::from_str(&format!("app;dur={millis:.2}")) {
        response.headers_mut().insert(SERVER_TIMING.clone(), value);
    }
    response
}
