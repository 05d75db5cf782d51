use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct UserPostIn {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPost {
    pub id: usize,
    pub body: String,
}
