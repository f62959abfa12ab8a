use crate::models::DbProvider;
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_provider(
    pool: &Pool<Postgres>,
    name: &str,
    password_hash: Option<&str>,
) -> Result<DbProvider> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Creating provider: id={}, name={}, has_password={}",
        id, name, password_hash.is_some()
    );

    let provider = sqlx::query_as::<_, DbProvider>(
        r#"
        INSERT INTO providers (id, name, password_hash, created_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, password_hash, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(password_hash)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(provider)
}

pub async fn get_provider_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbProvider>> {
    let provider = sqlx::query_as::<_, DbProvider>(
        r#"
        SELECT id, name, password_hash, created_at
        FROM providers
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(provider)
}
