use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create providers table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS providers (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL,
            password_hash VARCHAR(255) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // One row per (provider, date) document
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS availability (
            provider_id UUID NOT NULL REFERENCES providers(id),
            date DATE NOT NULL,
            version BIGINT NOT NULL DEFAULT 1,
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            PRIMARY KEY (provider_id, date)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Slots of a document, ordered by position
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS availability_slots (
            id UUID NOT NULL,
            provider_id UUID NOT NULL,
            date DATE NOT NULL,
            position INTEGER NOT NULL,
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            status VARCHAR(16) NOT NULL,
            source VARCHAR(255) NULL,
            PRIMARY KEY (provider_id, date, id),
            FOREIGN KEY (provider_id, date) REFERENCES availability(provider_id, date) ON DELETE CASCADE,
            CONSTRAINT valid_slot_range CHECK (end_time > start_time),
            CONSTRAINT valid_slot_status CHECK (status IN ('available', 'busy', 'booked')),
            CONSTRAINT source_only_when_booked CHECK ((status = 'booked') = (source IS NOT NULL))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create bookings table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            provider_id UUID NOT NULL REFERENCES providers(id),
            customer_id VARCHAR(255) NOT NULL,
            customer_name VARCHAR(255) NOT NULL,
            service_id VARCHAR(255) NULL,
            service_name VARCHAR(255) NULL,
            date DATE NOT NULL,
            slot_id UUID NOT NULL,
            slot_start TIME NOT NULL,
            slot_end TIME NOT NULL,
            status VARCHAR(16) NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create notifications table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            provider_id UUID NOT NULL REFERENCES providers(id),
            kind VARCHAR(32) NOT NULL,
            message TEXT NOT NULL,
            customer_name VARCHAR(255) NOT NULL,
            service_name VARCHAR(255) NULL,
            date DATE NOT NULL,
            time VARCHAR(64) NOT NULL,
            read BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_availability_slots_document ON availability_slots(provider_id, date, position);
        CREATE INDEX IF NOT EXISTS idx_bookings_provider_id ON bookings(provider_id);
        CREATE INDEX IF NOT EXISTS idx_notifications_provider_id ON notifications(provider_id);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
