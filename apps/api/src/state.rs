use crate::posts::PostStore;
use crate::questions::service::QuestionService;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every handle here is explicitly scoped; there are no module-level globals.
#[derive(Clone)]
pub struct AppState {
    pub questions: QuestionService,
    /// In-memory demo posts, lost on restart.
    pub posts: PostStore,
}
