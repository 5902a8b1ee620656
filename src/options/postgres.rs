use ::anyhow::Result;
use ::serde_json::Value;

use crate::options::interface;

pub struct PostgresOptionsStore {
    pool: ::sqlx::PgPool,
}

impl PostgresOptionsStore {
    pub fn new(pool: ::sqlx::PgPool) -> PostgresOptionsStore {
        PostgresOptionsStore { pool }
    }
}

pub async fn setup(pool: &::sqlx::PgPool) -> Result<()> {
    ::sqlx::query(
        "
        CREATE TABLE IF NOT EXISTS options (
            name  TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
    ",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[::async_trait::async_trait]
impl interface::OptionsStore for PostgresOptionsStore {
    async fn get(&self, name: &str) -> Result<Option<Value>> {
        const STATEMENT: &str = "
            SELECT value FROM options WHERE name = $1;
        ";

        let row: Option<String> = ::sqlx::query_scalar(STATEMENT)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(raw) => Ok(Some(::serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, name: &str, value: Value) -> Result<()> {
        const STATEMENT: &str = "
            INSERT INTO options (name, value)
            VALUES ($1, $2)
            ON CONFLICT (name)
            DO UPDATE SET value = EXCLUDED.value;
        ";

        ::sqlx::query(STATEMENT)
            .bind(name)
            .bind(::serde_json::to_string(&value)?)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        const STATEMENT: &str = "
            DELETE FROM options WHERE name = $1;
        ";

        ::sqlx::query(STATEMENT)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
