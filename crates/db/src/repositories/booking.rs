use crate::models::{DbBooking, DbNotification};
use chrono::{NaiveDate, Utc};
use eyre::Result;
use slotbook_core::models::booking::{BookingStatus, NewBooking, NewNotification};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

// Booking Repository

/// Runs on the caller's connection so the store can record the booking in
/// the same transaction that claims the slot.
pub async fn create_booking(conn: &mut PgConnection, booking: &NewBooking) -> Result<DbBooking> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        INSERT INTO bookings (id, provider_id, customer_id, customer_name, service_id, service_name,
                              date, slot_id, slot_start, slot_end, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id, provider_id, customer_id, customer_name, service_id, service_name,
                  date, slot_id, slot_start, slot_end, status, created_at
        "#,
    )
    .bind(id)
    .bind(booking.provider_id)
    .bind(&booking.customer_id)
    .bind(&booking.customer_name)
    .bind(&booking.service_id)
    .bind(&booking.service_name)
    .bind(booking.date)
    .bind(booking.slot_id.0)
    .bind(booking.slot_start)
    .bind(booking.slot_end)
    .bind(BookingStatus::Confirmed.as_str())
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(booking)
}

/// The most recent confirmed booking of one slot, whoever made it.
pub async fn latest_confirmed_booking(
    conn: &mut PgConnection,
    provider_id: Uuid,
    date: NaiveDate,
    slot_id: Uuid,
) -> Result<Option<DbBooking>> {
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, provider_id, customer_id, customer_name, service_id, service_name,
               date, slot_id, slot_start, slot_end, status, created_at
        FROM bookings
        WHERE provider_id = $1 AND date = $2 AND slot_id = $3 AND status = $4
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .bind(slot_id)
    .bind(BookingStatus::Confirmed.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(booking)
}

pub async fn get_bookings_by_provider_id(pool: &Pool<Postgres>, provider_id: Uuid) -> Result<Vec<DbBooking>> {
    let bookings = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, provider_id, customer_id, customer_name, service_id, service_name,
               date, slot_id, slot_start, slot_end, status, created_at
        FROM bookings
        WHERE provider_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(provider_id)
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

// Notification Repository

pub async fn create_notification(
    pool: &Pool<Postgres>,
    notification: &NewNotification,
) -> Result<DbNotification> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let notification = sqlx::query_as::<_, DbNotification>(
        r#"
        INSERT INTO notifications (id, provider_id, kind, message, customer_name, service_name,
                                   date, time, read, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9)
        RETURNING id, provider_id, kind, message, customer_name, service_name,
                  date, time, read, created_at
        "#,
    )
    .bind(id)
    .bind(notification.provider_id)
    .bind(notification.kind.as_str())
    .bind(&notification.message)
    .bind(&notification.customer_name)
    .bind(&notification.service_name)
    .bind(notification.date)
    .bind(&notification.time)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(notification)
}

pub async fn get_notifications_by_provider_id(
    pool: &Pool<Postgres>,
    provider_id: Uuid,
) -> Result<Vec<DbNotification>> {
    let notifications = sqlx::query_as::<_, DbNotification>(
        r#"
        SELECT id, provider_id, kind, message, customer_name, service_name,
               date, time, read, created_at
        FROM notifications
        WHERE provider_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(provider_id)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

pub async fn mark_notification_read(
    pool: &Pool<Postgres>,
    provider_id: Uuid,
    notification_id: Uuid,
) -> Result<Option<DbNotification>> {
    let notification = sqlx::query_as::<_, DbNotification>(
        r#"
        UPDATE notifications
        SET read = TRUE
        WHERE id = $1 AND provider_id = $2
        RETURNING id, provider_id, kind, message, customer_name, service_name,
                  date, time, read, created_at
        "#,
    )
    .bind(notification_id)
    .bind(provider_id)
    .fetch_optional(pool)
    .await?;

    Ok(notification)
}
