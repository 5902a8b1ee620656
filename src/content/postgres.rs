use ::anyhow::Result;
use ::serde_json::Value;

use crate::content::interface;
use crate::model::{Author, NewPost, Post, PostStatus, PostUpdate, TermKind};

pub struct PostgresContentStore {
    pool: ::sqlx::PgPool,
}

impl PostgresContentStore {
    pub fn new(pool: ::sqlx::PgPool) -> PostgresContentStore {
        PostgresContentStore { pool }
    }

    async fn term_names_of(&self, post_id: i64, kind: TermKind) -> Result<Vec<String>> {
        const STATEMENT: &str = "
            SELECT terms.name
            FROM terms
            JOIN post_terms ON post_terms.term_id = terms.id
            WHERE post_terms.post_id = $1
            AND terms.kind = $2
            ORDER BY terms.id;
        ";

        let names: Vec<String> = ::sqlx::query_scalar(STATEMENT)
            .bind(post_id)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(names)
    }

    async fn term_ids_of(&self, post_id: i64, kind: TermKind) -> Result<Vec<i64>> {
        const STATEMENT: &str = "
            SELECT terms.id
            FROM terms
            JOIN post_terms ON post_terms.term_id = terms.id
            WHERE post_terms.post_id = $1
            AND terms.kind = $2
            ORDER BY terms.id;
        ";

        let ids: Vec<i64> = ::sqlx::query_scalar(STATEMENT)
            .bind(post_id)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }
}

pub async fn setup(pool: &::sqlx::PgPool) -> Result<()> {
    ::sqlx::query(
        "
        CREATE TABLE IF NOT EXISTS posts (
            id            BIGSERIAL PRIMARY KEY,
            title         TEXT NOT NULL,
            content       TEXT NOT NULL,
            excerpt       TEXT NOT NULL,
            status        TEXT NOT NULL,
            author_id     INT8 NOT NULL,
            author_name   TEXT NOT NULL,
            date          TEXT NOT NULL,
            permalink     TEXT NOT NULL,
            thumbnail_url TEXT
        );
    ",
    )
    .execute(pool)
    .await?;

    ::sqlx::query(
        "
        CREATE TABLE IF NOT EXISTS post_meta (
            post_id INT8 NOT NULL,
            name    TEXT NOT NULL,
            value   TEXT NOT NULL
        );
    ",
    )
    .execute(pool)
    .await?;

    ::sqlx::query(
        "
        CREATE UNIQUE INDEX IF NOT EXISTS post_meta_index
        ON post_meta (post_id, name);
    ",
    )
    .execute(pool)
    .await?;

    ::sqlx::query(
        "
        CREATE TABLE IF NOT EXISTS terms (
            id   BIGSERIAL PRIMARY KEY,
            kind TEXT NOT NULL,
            name TEXT NOT NULL
        );
    ",
    )
    .execute(pool)
    .await?;

    ::sqlx::query(
        "
        CREATE TABLE IF NOT EXISTS post_terms (
            post_id INT8 NOT NULL,
            term_id INT8 NOT NULL
        );
    ",
    )
    .execute(pool)
    .await?;

    ::sqlx::query(
        "
        CREATE TABLE IF NOT EXISTS users (
            id   BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL
        );
    ",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(::sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    excerpt: String,
    status: String,
    author_id: i64,
    author_name: String,
    date: String,
    permalink: String,
    thumbnail_url: Option<String>,
}

#[derive(::sqlx::FromRow)]
struct AuthorRow {
    id: i64,
    name: String,
}

#[::async_trait::async_trait]
impl interface::ContentStore for PostgresContentStore {
    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        const STATEMENT: &str = "
            SELECT id, title, content, excerpt, status, author_id,
                   author_name, date, permalink, thumbnail_url
            FROM posts
            WHERE id = $1;
        ";

        let row: Option<PostRow> = ::sqlx::query_as(STATEMENT)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let tags = self.term_names_of(id, TermKind::Tag).await?;
        let categories = self.term_names_of(id, TermKind::Category).await?;

        Ok(Some(Post {
            id: row.id,
            title: row.title,
            content: row.content,
            excerpt: row.excerpt,
            status: PostStatus::parse(&row.status)?,
            author_id: row.author_id,
            author_name: row.author_name,
            date: row.date,
            permalink: row.permalink,
            thumbnail_url: row.thumbnail_url,
            tags,
            categories,
        }))
    }

    async fn create_post(&self, new_post: &NewPost) -> Result<i64> {
        const STATEMENT: &str = "
            INSERT INTO posts
                (title, content, excerpt, status, author_id,
                 author_name, date, permalink)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id;
        ";

        let id: i64 = ::sqlx::query_scalar(STATEMENT)
            .bind(&new_post.title)
            .bind(&new_post.content)
            .bind(&new_post.excerpt)
            .bind(new_post.status.as_str())
            .bind(new_post.author_id)
            .bind(&new_post.author_name)
            .bind(&new_post.date)
            .bind(&new_post.permalink)
            .fetch_one(&self.pool)
            .await?;

        Ok(id)
    }

    async fn update_post(&self, id: i64, update: &PostUpdate) -> Result<()> {
        const STATEMENT: &str = "
            UPDATE posts
            SET title   = COALESCE($2, title),
                content = COALESCE($3, content),
                excerpt = COALESCE($4, excerpt)
            WHERE id = $1;
        ";

        ::sqlx::query(STATEMENT)
            .bind(id)
            .bind(update.title.as_deref())
            .bind(update.content.as_deref())
            .bind(update.excerpt.as_deref())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_meta(&self, post_id: i64, name: &str) -> Result<Option<Value>> {
        const STATEMENT: &str = "
            SELECT value FROM post_meta WHERE post_id = $1 AND name = $2;
        ";

        let row: Option<String> = ::sqlx::query_scalar(STATEMENT)
            .bind(post_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(raw) => Ok(Some(::serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_meta(&self, post_id: i64, name: &str, value: Value) -> Result<()> {
        const STATEMENT: &str = "
            INSERT INTO post_meta (post_id, name, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (post_id, name)
            DO UPDATE SET value = EXCLUDED.value;
        ";

        ::sqlx::query(STATEMENT)
            .bind(post_id)
            .bind(name)
            .bind(::serde_json::to_string(&value)?)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_meta(&self, post_id: i64, name: &str) -> Result<()> {
        const STATEMENT: &str = "
            DELETE FROM post_meta WHERE post_id = $1 AND name = $2;
        ";

        ::sqlx::query(STATEMENT)
            .bind(post_id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_post_by_meta_pair(
        &self,
        first: (&str, &Value),
        second: (&str, &Value),
    ) -> Result<Option<i64>> {
        const STATEMENT: &str = "
            SELECT a.post_id
            FROM post_meta a
            JOIN post_meta b ON b.post_id = a.post_id
            WHERE a.name = $1 AND a.value = $2
            AND b.name = $3 AND b.value = $4
            ORDER BY a.post_id
            LIMIT 1;
        ";

        let row: Option<i64> = ::sqlx::query_scalar(STATEMENT)
            .bind(first.0)
            .bind(::serde_json::to_string(first.1)?)
            .bind(second.0)
            .bind(::serde_json::to_string(second.1)?)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn category_ids_of(&self, post_id: i64) -> Result<Vec<i64>> {
        self.term_ids_of(post_id, TermKind::Category).await
    }

    async fn tag_ids_of(&self, post_id: i64) -> Result<Vec<i64>> {
        self.term_ids_of(post_id, TermKind::Tag).await
    }

    async fn set_thumbnail(&self, post_id: i64, url: &str) -> Result<()> {
        const STATEMENT: &str = "
            UPDATE posts SET thumbnail_url = $2 WHERE id = $1;
        ";

        ::sqlx::query(STATEMENT)
            .bind(post_id)
            .bind(url)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn default_author(&self) -> Result<Option<Author>> {
        const STATEMENT: &str = "
            SELECT id, name
            FROM users
            WHERE role = 'administrator'
            ORDER BY id
            LIMIT 1;
        ";

        let row: Option<AuthorRow> = ::sqlx::query_as(STATEMENT)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Author {
            id: row.id,
            name: row.name,
        }))
    }
}
