use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    blogs::{
        dto::{CreateBlogRequest, MessageResponse},
        repo_types::{Blog, PublicBlog},
    },
    error::ApiError,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs/allblogs", get(list_all_blogs))
        .route("/blogs/myblogs", get(list_my_blogs))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", post(create_blog))
        .route("/blogs/:id", delete(delete_blog))
}

#[instrument(skip(state, payload))]
pub async fn create_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateBlogRequest>,
) -> Result<(StatusCode, Json<Blog>), ApiError> {
    if payload.title.trim().is_empty()
        || payload.description.trim().is_empty()
        || payload.tags.trim().is_empty()
    {
        warn!(%user_id, "create blog with missing fields");
        return Err(ApiError::Validation("All fields are required".into()));
    }

    // Author comes from the verified token, never from the request body.
    let blog = Blog::create(
        &state.db,
        user_id,
        payload.title.trim(),
        &payload.description,
        payload.tags.trim(),
    )
    .await?;

    info!(blog_id = %blog.id, author = %user_id, "blog created");
    Ok((StatusCode::CREATED, Json(blog)))
}

#[instrument(skip(state))]
pub async fn list_my_blogs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Blog>>, ApiError> {
    let blogs = Blog::list_by_author(&state.db, user_id).await?;
    Ok(Json(blogs))
}

/// Public listing; no token required, authors exposed as usernames only.
#[instrument(skip(state))]
pub async fn list_all_blogs(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicBlog>>, ApiError> {
    let blogs = Blog::list_all(&state.db).await?;
    Ok(Json(blogs))
}

/// Existence is checked before ownership, ownership before the delete
/// itself. A delete racing another session's delete of the same id observes
/// zero affected rows and reports NotFound.
#[instrument(skip(state))]
pub async fn delete_blog(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let blog = Blog::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;

    blog.authorize_author(user_id)?;

    if !Blog::delete_by_id(&state.db, id).await? {
        return Err(ApiError::NotFound("Blog not found".into()));
    }

    info!(blog_id = %id, author = %user_id, "blog deleted");
    Ok(Json(MessageResponse {
        message: "Blog deleted successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults_missing_fields_to_empty() {
        let parsed: CreateBlogRequest = serde_json::from_str(r#"{"title":"Hi"}"#).unwrap();
        assert_eq!(parsed.title, "Hi");
        assert!(parsed.description.is_empty());
        assert!(parsed.tags.is_empty());
    }

    #[test]
    fn public_blog_serializes_author_as_name() {
        let blog = PublicBlog {
            id: Uuid::new_v4(),
            title: "Hi".into(),
            description: "<p>hello</p>".into(),
            tags: "intro".into(),
            author: "annlee".into(),
            created_at: time::OffsetDateTime::now_utc(),
            updated_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&blog).unwrap();
        assert!(json.contains("\"author\":\"annlee\""));
    }
}
