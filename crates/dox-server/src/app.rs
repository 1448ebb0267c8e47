//! Router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers::{blog, docs, navigation};
use crate::state::AppState;
use crate::ws;

/// Build the application router.
///
/// The `/ws/reload` route is only mounted when a watcher is attached
/// to the state.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/docs", get(docs::list_docs))
        .route("/docs/{*slug}", get(docs::get_doc))
        .route("/navigation", get(navigation::get_navigation))
        .route("/blog", get(blog::list_posts))
        .route("/blog/tags", get(blog::list_tags))
        .route("/blog/{slug}", get(blog::get_post));

    let mut router = Router::new().nest("/api", api);

    if state.watcher.is_some() {
        router = router.route("/ws/reload", get(ws::ws_handler));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
