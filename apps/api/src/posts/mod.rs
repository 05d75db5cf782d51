//! Ephemeral demo posts. Held in `AppState`, gone when the process exits.

pub mod handlers;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::post::UserPost;

#[derive(Clone, Default)]
pub struct PostStore {
    posts: Arc<Mutex<Vec<UserPost>>>,
}

impl PostStore {
    /// Appends a post; its id is the number of posts before it.
    pub fn create(&self, body: String) -> UserPost {
        let mut posts = self.lock();
        let post = UserPost {
            id: posts.len(),
            body,
        };
        posts.push(post.clone());
        post
    }

    pub fn list(&self) -> Vec<UserPost> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UserPost>> {
        // Poisoning is ignored: every mutation is a single push.
        self.posts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
