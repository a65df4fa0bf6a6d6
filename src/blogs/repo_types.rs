use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

/// Blog record. `author` is assigned at creation from the verified token and
/// no statement in the crate updates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub author: Uuid,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Blog {
    /// Ownership check for mutations. Callers must have already established
    /// that the blog exists; existence precedes ownership precedes mutation.
    pub fn authorize_author(&self, user_id: Uuid) -> Result<(), ApiError> {
        if self.author == user_id {
            Ok(())
        } else {
            Err(ApiError::not_authorized())
        }
    }
}

/// Publicly listed blog row; the author appears as a display name only.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PublicBlog {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub author: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn blog_owned_by(author: Uuid) -> Blog {
        Blog {
            id: Uuid::new_v4(),
            author,
            title: "Hi".into(),
            description: "<p>hello</p>".into(),
            tags: "intro".into(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn author_may_mutate() {
        let owner = Uuid::new_v4();
        assert!(blog_owned_by(owner).authorize_author(owner).is_ok());
    }

    #[test]
    fn non_author_is_rejected_with_403() {
        let blog = blog_owned_by(Uuid::new_v4());
        let err = blog.authorize_author(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Not authorized");
    }
}
