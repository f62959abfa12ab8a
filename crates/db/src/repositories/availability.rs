//! Availability queries. Everything here takes a connection so the store can
//! run several of them inside one transaction.

use crate::models::{DbAvailability, DbSlot};
use chrono::{NaiveDate, Utc};
use eyre::Result;
use slotbook_core::models::slot::Slot;
use sqlx::PgConnection;
use uuid::Uuid;

pub const CHANGE_CHANNEL: &str = "availability_changed";

pub async fn get_availability(
    conn: &mut PgConnection,
    provider_id: Uuid,
    date: NaiveDate,
) -> Result<Option<DbAvailability>> {
    let availability = sqlx::query_as::<_, DbAvailability>(
        r#"
        SELECT provider_id, date, version, updated_at
        FROM availability
        WHERE provider_id = $1 AND date = $2
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(availability)
}

/// Same as [`get_availability`] but holds a row lock until the transaction
/// ends, serialising writers of one document.
pub async fn lock_availability(
    conn: &mut PgConnection,
    provider_id: Uuid,
    date: NaiveDate,
) -> Result<Option<DbAvailability>> {
    let availability = sqlx::query_as::<_, DbAvailability>(
        r#"
        SELECT provider_id, date, version, updated_at
        FROM availability
        WHERE provider_id = $1 AND date = $2
        FOR UPDATE
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(availability)
}

/// Creates the document row at version 1 unless it exists. Returns `None` when
/// another transaction created it first; Postgres makes this wait for that
/// transaction to finish.
pub async fn insert_availability(
    conn: &mut PgConnection,
    provider_id: Uuid,
    date: NaiveDate,
) -> Result<Option<DbAvailability>> {
    let availability = sqlx::query_as::<_, DbAvailability>(
        r#"
        INSERT INTO availability (provider_id, date, version, updated_at)
        VALUES ($1, $2, 1, $3)
        ON CONFLICT (provider_id, date) DO NOTHING
        RETURNING provider_id, date, version, updated_at
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(availability)
}

/// Creates the document row or bumps its version.
pub async fn upsert_availability(
    conn: &mut PgConnection,
    provider_id: Uuid,
    date: NaiveDate,
) -> Result<DbAvailability> {
    let now = Utc::now();

    let availability = sqlx::query_as::<_, DbAvailability>(
        r#"
        INSERT INTO availability (provider_id, date, version, updated_at)
        VALUES ($1, $2, 1, $3)
        ON CONFLICT (provider_id, date)
        DO UPDATE SET version = availability.version + 1, updated_at = $3
        RETURNING provider_id, date, version, updated_at
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(availability)
}

pub async fn get_slots(conn: &mut PgConnection, provider_id: Uuid, date: NaiveDate) -> Result<Vec<DbSlot>> {
    let slots = sqlx::query_as::<_, DbSlot>(
        r#"
        SELECT id, provider_id, date, position, start_time, end_time, status, source
        FROM availability_slots
        WHERE provider_id = $1 AND date = $2
        ORDER BY position ASC
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .fetch_all(&mut *conn)
    .await?;

    Ok(slots)
}

pub async fn lock_slot(
    conn: &mut PgConnection,
    provider_id: Uuid,
    date: NaiveDate,
    slot_id: Uuid,
) -> Result<Option<DbSlot>> {
    let slot = sqlx::query_as::<_, DbSlot>(
        r#"
        SELECT id, provider_id, date, position, start_time, end_time, status, source
        FROM availability_slots
        WHERE provider_id = $1 AND date = $2 AND id = $3
        FOR UPDATE
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .bind(slot_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(slot)
}

pub async fn insert_slot(
    conn: &mut PgConnection,
    provider_id: Uuid,
    date: NaiveDate,
    position: i32,
    slot: &Slot,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO availability_slots (id, provider_id, date, position, start_time, end_time, status, source)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(slot.id.0)
    .bind(provider_id)
    .bind(date)
    .bind(position)
    .bind(slot.start)
    .bind(slot.end)
    .bind(slot.status.kind())
    .bind(slot.status.source().map(ToString::to_string))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn update_slot_status(
    conn: &mut PgConnection,
    provider_id: Uuid,
    date: NaiveDate,
    slot: &Slot,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE availability_slots
        SET status = $4, source = $5
        WHERE provider_id = $1 AND date = $2 AND id = $3
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .bind(slot.id.0)
    .bind(slot.status.kind())
    .bind(slot.status.source().map(ToString::to_string))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn delete_slot(
    conn: &mut PgConnection,
    provider_id: Uuid,
    date: NaiveDate,
    slot_id: Uuid,
) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM availability_slots
        WHERE provider_id = $1 AND date = $2 AND id = $3
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .bind(slot_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn delete_slots(conn: &mut PgConnection, provider_id: Uuid, date: NaiveDate) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM availability_slots
        WHERE provider_id = $1 AND date = $2
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Tells other processes listening on [`CHANGE_CHANNEL`] that a document
/// changed. Delivered by Postgres on commit.
pub async fn notify_change(conn: &mut PgConnection, payload: &str) -> Result<()> {
    sqlx::query("SELECT pg_notify($1, $2)")
        .bind(CHANGE_CHANNEL)
        .bind(payload)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
