use std::collections::HashMap;
use std::time::Duration;

use pretty_assertions::assert_eq;
use slotbook_api::config::{ApiConfig, StoreBackend};
use tracing::Level;

fn load(vars: &[(&str, &str)]) -> eyre::Result<ApiConfig> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ApiConfig::from_lookup(|name| vars.get(name).cloned())
}

#[test]
fn test_defaults() {
    let config = load(&[("DATABASE_URL", "postgres://localhost/slotbook")]).unwrap();

    assert_eq!(config.server_addr(), "0.0.0.0:3000");
    assert_eq!(config.store_backend, StoreBackend::Postgres);
    assert_eq!(config.store_timeout, Duration::from_millis(5000));
    assert_eq!(config.change_feed_capacity, 64);
    assert_eq!(config.request_timeout, 30);
    assert_eq!(config.log_level, Level::INFO);
    assert!(config.cors_origins.is_none());
}

#[test]
fn test_postgres_backend_requires_database_url() {
    assert!(load(&[]).is_err());
}

#[test]
fn test_memory_backend() {
    let config = load(&[
        ("STORE_BACKEND", "memory"),
        ("STORE_TIMEOUT_MS", "250"),
        ("LOG_LEVEL", "DEBUG"),
        ("API_CORS_ORIGINS", "http://localhost:5173, https://book.example.com"),
    ])
    .unwrap();

    assert_eq!(config.store_backend, StoreBackend::Memory);
    assert!(config.database_url.is_none());
    assert_eq!(config.store_timeout, Duration::from_millis(250));
    assert_eq!(config.log_level, Level::DEBUG);
    assert_eq!(
        config.cors_origins,
        Some(vec![
            "http://localhost:5173".to_string(),
            "https://book.example.com".to_string()
        ])
    );
}

#[test]
fn test_invalid_values() {
    assert!(load(&[("STORE_BACKEND", "redis")]).is_err());
    assert!(load(&[("STORE_BACKEND", "memory"), ("API_PORT", "http")]).is_err());
    assert!(load(&[("STORE_BACKEND", "memory"), ("STORE_TIMEOUT_MS", "soon")]).is_err());
}
