//! Blog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use dox_content::BlogPost;
use serde::{Deserialize, Serialize};

use super::not_found;
use crate::state::AppState;

/// Listing entry returned by `GET /api/blog`. Bodies are replaced by
/// the excerpt.
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub excerpt: String,
}

impl From<BlogPost> for PostSummary {
    fn from(post: BlogPost) -> Self {
        Self {
            slug: post.slug,
            title: post.meta.title,
            description: post.meta.description,
            author: post.meta.author,
            date: post.meta.date,
            tags: post.meta.tags,
            featured: post.meta.featured,
            image: post.meta.image,
            excerpt: post.excerpt,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<PostSummary>,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostsQuery {
    pub tag: Option<String>,
}

/// `GET /api/blog`: list posts, optionally filtered by `?tag=`.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostsQuery>,
) -> Json<PostsResponse> {
    let posts = match query.tag {
        Some(tag) => state.library.posts_by_tag(&tag),
        None => state.library.all_posts(),
    };

    Json(PostsResponse {
        posts: posts.into_iter().map(PostSummary::from).collect(),
    })
}

/// `GET /api/blog/tags`: every tag used by a visible post.
pub async fn list_tags(State(state): State<Arc<AppState>>) -> Json<TagsResponse> {
    Json(TagsResponse {
        tags: state.library.tags(),
    })
}

/// `GET /api/blog/{slug}`: fetch a single post with its body.
pub async fn get_post(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> Response {
    match state.library.post_by_slug(&slug) {
        Some(post) => Json(post).into_response(),
        None => not_found(format!("post not found: {slug}")).into_response(),
    }
}
