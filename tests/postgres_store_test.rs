//! Live PostgreSQL tests for the quote store.
//!
//! Requires a reachable database. Run with:
//! DATABASE_URL="postgres://localhost/crypto_test" cargo test --test postgres_store_test -- --ignored

use chrono::NaiveDate;
use crypto_etl::config::DatabaseConfig;
use crypto_etl::core::QuoteStore;
use crypto_etl::domain::model::QuoteRow;
use crypto_etl::PostgresStore;
use rust_decimal::Decimal;
use std::str::FromStr;

async fn connect() -> PostgresStore {
    let config = DatabaseConfig {
        url: Some(std::env::var("DATABASE_URL").expect("DATABASE_URL must be set")),
        ..DatabaseConfig::default()
    };
    PostgresStore::connect(&config)
        .await
        .expect("failed to connect to test database")
}

fn row(name: &str, symbol: &str, minute: u32) -> QuoteRow {
    QuoteRow {
        name: name.to_string(),
        symbol: symbol.to_string(),
        rank: Some(1),
        price_usd: Decimal::from_str("64000.1234567891").unwrap(),
        volume_24h_usd: None,
        market_cap_usd: Some(Decimal::from_str("1260000000000.5").unwrap()),
        last_updated: NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, minute, 0)
            .unwrap(),
    }
}

async fn cleanup(store: &PostgresStore, symbol: &str) {
    sqlx::query("DELETE FROM cryptocurrency_data WHERE symbol = $1")
        .bind(symbol)
        .execute(store.pool())
        .await
        .unwrap();
}

#[tokio::test]
#[ignore]
async fn test_schema_is_idempotent() {
    let store = connect().await;
    store.ensure_schema().await.unwrap();
    store.ensure_schema().await.unwrap();
    store.close().await;
}

#[tokio::test]
#[ignore]
async fn test_insert_ignores_duplicates() {
    let store = connect().await;
    store.ensure_schema().await.unwrap();
    cleanup(&store, "ZZTEST").await;

    let batch = vec![row("Zz Test", "ZZTEST", 0), row("Zz Test", "ZZTEST", 1)];
    assert_eq!(store.insert_quotes(&batch).await.unwrap(), 2);
    assert_eq!(store.insert_quotes(&batch).await.unwrap(), 0);

    let (count, cap): (i64, Option<Decimal>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(market_cap_usd) FROM cryptocurrency_data WHERE symbol = $1",
    )
    .bind("ZZTEST")
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(count, 2);
    assert_eq!(cap, Some(Decimal::from_str("1260000000000.5").unwrap()));

    cleanup(&store, "ZZTEST").await;
    store.close().await;
}

#[tokio::test]
#[ignore]
async fn test_failed_batch_rolls_back() {
    let store = connect().await;
    store.ensure_schema().await.unwrap();
    cleanup(&store, "ZZROLL").await;

    // The second row violates VARCHAR(10) and must take the first one with it.
    let batch = vec![row("Zz Roll", "ZZROLL", 0), row("Zz Roll", "ZZROLLBACK1", 1)];
    assert!(store.insert_quotes(&batch).await.is_err());

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM cryptocurrency_data WHERE symbol = $1")
            .bind("ZZROLL")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(count, 0);

    store.close().await;
}

#[tokio::test]
#[ignore]
async fn test_empty_batch_is_noop() {
    let store = connect().await;
    assert_eq!(store.insert_quotes(&[]).await.unwrap(), 0);
    store.close().await;
}
