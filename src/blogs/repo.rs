use sqlx::PgPool;
use uuid::Uuid;

use crate::blogs::repo_types::{Blog, PublicBlog};

impl Blog {
    pub async fn create(
        db: &PgPool,
        author: Uuid,
        title: &str,
        description: &str,
        tags: &str,
    ) -> anyhow::Result<Blog> {
        let blog = sqlx::query_as::<_, Blog>(
            r#"
            INSERT INTO blogs (author, title, description, tags)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author, title, description, tags, created_at, updated_at
            "#,
        )
        .bind(author)
        .bind(title)
        .bind(description)
        .bind(tags)
        .fetch_one(db)
        .await?;
        Ok(blog)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Blog>> {
        let blog = sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, author, title, description, tags, created_at, updated_at
            FROM blogs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(blog)
    }

    pub async fn list_by_author(db: &PgPool, author: Uuid) -> anyhow::Result<Vec<Blog>> {
        let rows = sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, author, title, description, tags, created_at, updated_at
            FROM blogs
            WHERE author = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(author)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// All blogs for the public listing; the join exposes the author only as
    /// a username.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<PublicBlog>> {
        let rows = sqlx::query_as::<_, PublicBlog>(
            r#"
            SELECT b.id, b.title, b.description, b.tags,
                   u.username AS author, b.created_at, b.updated_at
            FROM blogs b
            JOIN users u ON u.id = b.author
            ORDER BY b.created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Delete without a cross-request lock. Returns whether a row was
    /// removed; a concurrent delete that got there first shows up as false
    /// and the caller reports NotFound, never a 500.
    pub async fn delete_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
