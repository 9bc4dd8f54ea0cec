//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::handlers::{
    create_session_handler, delete_handler, delete_session_handler, get_handler,
    get_item_handler, get_items_handler, get_session_handler, health_handler, set_handler,
    set_item_handler, update_session_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a key-value pair
/// - `GET /get/:key` - Retrieve a value by key
/// - `DELETE /del/:key` - Delete a key
/// - `PUT /hset` - Set one field of a hash
/// - `GET /hget/:key/:field` - Retrieve one field of a hash
/// - `GET /hgetall/:key` - Retrieve all fields of a hash
/// - `POST /sessions`, `GET|PUT|DELETE /sessions/:id` - Session storage
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: `allowed_origins`, or any origin when empty
/// - Tracing: Logs all requests
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/hset", put(set_item_handler))
        .route("/hget/:key/:field", get(get_item_handler))
        .route("/hgetall/:key", get(get_items_handler))
        .route("/sessions", post(create_session_handler))
        .route(
            "/sessions/:id",
            get(get_session_handler)
                .put(update_session_handler)
                .delete(delete_session_handler),
        )
        .route("/health", get(health_handler))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
