use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::models::post::{UserPost, UserPostIn};
use crate::state::AppState;

/// GET /
pub async fn handle_root() -> Json<Value> {
    Json(json!({ "message": "Hello, World !" }))
}

/// POST /
pub async fn handle_create_post(
    State(state): State<AppState>,
    Json(post): Json<UserPostIn>,
) -> Json<UserPost> {
    Json(state.posts.create(post.body))
}

/// GET /post
pub async fn handle_list_posts(State(state): State<AppState>) -> Json<Vec<UserPost>> {
    Json(state.posts.list())
}
