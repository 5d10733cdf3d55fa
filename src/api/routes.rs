use axum::{
    extract::{DefaultBodyLimit, Request},
    http::HeaderMap,
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::auth::{test_token_middleware, TestTokenGuard};
use crate::config::Config;
use crate::storage::Storage;

use super::handlers::{
    campaign_kpi, campaign_stats, channel_ranking, combination_stats, create_campaign,
    create_channel, create_creator, create_link, creator_stats, delete_campaign, delete_channel,
    delete_creator, delete_link, get_campaign, get_channel, get_creator, get_link, health_check,
    list_campaigns, list_channels, list_creators, list_links, login, patch_channel, reset_data,
    seed_clicks, seed_data, signup, slugs, today_stats, update_campaign, update_channel,
    update_creator, upload_image, AppState,
};

/// Room for multipart framing around the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_api_router(storage: Arc<dyn Storage>, config: &Config) -> Router {
    let state = Arc::new(AppState::new(storage, config));
    let upload_limit = state.upload.max_bytes + MULTIPART_OVERHEAD;

    let mut api = Router::new()
        .route("/health", get(health_check))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/campaigns", get(list_campaigns).post(create_campaign))
        .route(
            "/campaigns/{id}",
            get(get_campaign).put(update_campaign).delete(delete_campaign),
        )
        .route("/creators", get(list_creators).post(create_creator))
        .route(
            "/creators/{id}",
            get(get_creator).put(update_creator).delete(delete_creator),
        )
        .route("/channels", get(list_channels).post(create_channel))
        .route(
            "/channels/{id}",
            get(get_channel)
                .put(update_channel)
                .patch(patch_channel)
                .delete(delete_channel),
        )
        .route("/tracking-links", get(list_links).post(create_link))
        .route("/tracking-links/{id}", get(get_link).delete(delete_link))
        .route("/stats/campaigns", get(campaign_stats))
        .route("/stats/creators", get(creator_stats))
        .route("/stats/today", get(today_stats))
        .route("/stats/campaigns/{id}/kpi", get(campaign_kpi))
        .route("/stats/campaigns/{id}/combinations", get(combination_stats))
        .route("/stats/campaigns/{id}/channels/ranking", get(channel_ranking))
        .route(
            "/uploads",
            post(upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(Arc::clone(&state));

    if let Some(token) = config.test_token.clone() {
        let guard = Arc::new(TestTokenGuard::new(token));
        let test_routes = Router::new()
            .route("/reset", post(reset_data))
            .route("/seed", post(seed_data))
            .route("/seed-clicks", post(seed_clicks))
            .route("/slugs", get(slugs))
            .route_layer(middleware::from_fn(
                move |headers: HeaderMap, request: Request, next: Next| {
                    let guard = Arc::clone(&guard);
                    test_token_middleware(guard, headers, request, next)
                },
            ))
            .with_state(Arc::clone(&state));
        api = api.nest("/test", test_routes);
    }

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&state.upload.dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
