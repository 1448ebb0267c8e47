//! Navigation tree endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use dox_site::NavItem;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub items: Vec<NavItem>,
}

/// `GET /api/navigation`: the sidebar tree for the docs area.
pub async fn get_navigation(State(state): State<Arc<AppState>>) -> Json<NavigationResponse> {
    Json(NavigationResponse {
        items: state.library.navigation(),
    })
}
