pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::posts::handlers as posts;
use crate::questions::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Ephemeral demo posts
        .route("/", get(posts::handle_root).post(posts::handle_create_post))
        .route("/post", get(posts::handle_list_posts))
        // Questions API
        .route(
            "/api/questions",
            get(handlers::handle_list).post(handlers::handle_save),
        )
        .route("/api/questions/generate", post(handlers::handle_generate))
        .route(
            "/api/questions/:job_title",
            delete(handlers::handle_delete_by_job_title),
        )
        .route("/api/question/:id", delete(handlers::handle_delete_by_id))
        .route("/api/stats", get(handlers::handle_stats))
        .with_state(state)
}
