use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

impl User {
    /// Find a user by login name.
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, firstname, lastname, avatar, bio, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, firstname, lastname, avatar, bio, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Persist a new user. `password_hash` must already be hashed; this is
    /// the only insertion path and it never sees a plaintext password.
    pub async fn create(
        db: &PgPool,
        username: &str,
        firstname: &str,
        lastname: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, firstname, lastname, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, firstname, lastname, avatar, bio, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(firstname)
        .bind(lastname)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Update profile fields only. The hash column is not in the statement,
    /// so no profile change can ever touch the password.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        firstname: &str,
        lastname: &str,
        avatar: &str,
        bio: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET firstname = $2, lastname = $3, avatar = $4, bio = $5
            WHERE id = $1
            RETURNING id, username, firstname, lastname, avatar, bio, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(firstname)
        .bind(lastname)
        .bind(avatar)
        .bind(bio)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Explicit re-hash path; the caller hashes, this stores.
    pub async fn update_password(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
