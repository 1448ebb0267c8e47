//! Documentation page endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use dox_content::Document;
use dox_site::NavLink;
use serde::{Deserialize, Serialize};

use super::not_found;
use crate::state::AppState;

/// Listing entry returned by `GET /api/docs`. Bodies are omitted; the
/// full page is served by the slug endpoint.
#[derive(Debug, Serialize)]
pub struct DocSummary {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl From<Document> for DocSummary {
    fn from(doc: Document) -> Self {
        Self {
            slug: doc.slug,
            title: doc.meta.title,
            description: doc.meta.description,
            order: doc.meta.order,
            category: doc.meta.category,
            tags: doc.meta.tags,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocsResponse {
    pub docs: Vec<DocSummary>,
}

/// Full page payload returned by `GET /api/docs/{*slug}`.
#[derive(Debug, Serialize)]
pub struct DocResponse {
    #[serde(flatten)]
    pub doc: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<NavLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<NavLink>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocQuery {
    pub version: Option<String>,
}

/// `GET /api/docs`: list all documentation pages.
pub async fn list_docs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DocQuery>,
) -> Json<DocsResponse> {
    let docs = match query.version {
        Some(version) => state.library.all_docs_for_version(&version),
        None => state.library.all_docs(),
    };

    Json(DocsResponse {
        docs: docs.into_iter().map(DocSummary::from).collect(),
    })
}

/// `GET /api/docs/{*slug}`: fetch a single page with its reading-order
/// neighbours.
pub async fn get_doc(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<DocQuery>,
) -> Response {
    // Neighbours come from the same tree the document was resolved in.
    let looked_up = match query.version {
        Some(version) => state
            .library
            .doc_by_slug_for_version(&version, &slug)
            .map(|doc| {
                let neighbours = state.library.prev_next_for_version(&version, &doc.slug);
                (doc, neighbours)
            }),
        None => state.library.doc_by_slug(&slug).map(|doc| {
            let neighbours = state.library.prev_next(&doc.slug);
            (doc, neighbours)
        }),
    };

    match looked_up {
        Some((doc, neighbours)) => Json(DocResponse {
            doc,
            prev: neighbours.prev,
            next: neighbours.next,
        })
        .into_response(),
        None => not_found(format!("document not found: {slug}")).into_response(),
    }
}
