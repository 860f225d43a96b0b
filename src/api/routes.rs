use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Browsing sessions
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/sessions/:id/query", put(handlers::update_query))
        .route("/sessions/:id/more", post(handlers::load_more))
        .route("/sessions/:id/retry", post(handlers::retry))
        // Lookups
        .route("/movies/:id", get(handlers::get_movie))
        .route("/actors", get(handlers::search_actors))
        .route("/actors/movies", get(handlers::actor_movies))
        // Personal lists
        .route("/library", get(handlers::get_library))
        .route(
            "/library/:list",
            post(handlers::add_to_library).delete(handlers::clear_library),
        )
        .route("/library/:list/:id", delete(handlers::remove_from_library))
        .route("/compare", get(handlers::compare))
}
