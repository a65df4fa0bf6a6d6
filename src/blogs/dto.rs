use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateBlogRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
