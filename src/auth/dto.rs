use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login. Exists only for the duration of the call; the
/// plaintext password is never stored or logged.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

/// The part of a user embedded in auth responses.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Full profile as returned by /login/verify and /profile. Built from the
/// row struct, whose hash field is marked skip_serializing.
#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub firstname: String,
    pub lastname: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn user_envelope_never_serializes_hash() {
        let envelope = UserEnvelope {
            user: User {
                id: Uuid::new_v4(),
                username: "annlee".into(),
                firstname: "Ann".into(),
                lastname: "Lee".into(),
                avatar: "/avatars/default.jpg".into(),
                bio: String::new(),
                password_hash: "$argon2id$secret".into(),
                created_at: OffsetDateTime::now_utc(),
            },
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("annlee"));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
    }

    #[test]
    fn signup_request_defaults_missing_fields_to_empty() {
        let parsed: SignupRequest = serde_json::from_str(r#"{"username":"annlee"}"#).unwrap();
        assert_eq!(parsed.username, "annlee");
        assert!(parsed.firstname.is_empty());
        assert!(parsed.password.is_empty());
    }
}
