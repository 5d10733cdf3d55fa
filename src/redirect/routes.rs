use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use crate::registry::LinkRegistry;
use crate::storage::Storage;

use super::handlers::{follow_link, health_check, RedirectState};
use super::middleware::record_request_start;

pub fn create_redirect_router(storage: Arc<dyn Storage>) -> Router {
    let state = Arc::new(RedirectState {
        registry: Arc::new(LinkRegistry::new(Arc::clone(&storage))),
        storage,
    });

    Router::new()
        .route("/", get(health_check))
        .route("/t/{slug}", get(follow_link))
        .layer(middleware::from_fn(record_request_start))
        .with_state(state)
}
