//! PostgreSQL storage for quote rows.
//!
//! The pool connects lazily: a server can start while the database is still
//! unreachable, and each job run surfaces the connection failure on its own.

use crate::config::DatabaseConfig;
use crate::domain::model::QuoteRow;
use crate::domain::ports::QuoteStore;
use crate::utils::error::Result;
use crate::utils::validation::mask_password;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;

pub const TABLE_NAME: &str = "cryptocurrency_data";

pub(crate) const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS cryptocurrency_data (
    id SERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    symbol VARCHAR(10) NOT NULL,
    rank INT,
    price_usd DECIMAL(30, 10),
    volume_24h_usd DECIMAL(30, 10),
    market_cap_usd DECIMAL(30, 10),
    last_updated TIMESTAMP,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (name, symbol, last_updated)
)
"#;

pub(crate) const INSERT_QUOTE_SQL: &str = r#"
INSERT INTO cryptocurrency_data
    (name, symbol, rank, price_usd, volume_24h_usd, market_cap_usd, last_updated)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (name, symbol, last_updated) DO NOTHING
"#;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Builds the pool without opening any connection.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let options = connect_options(config)?;
        tracing::info!("Configuring PostgreSQL pool for {}", describe_target(config));

        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    /// Builds the pool and verifies connectivity immediately.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let store = Self::connect_lazy(config)?;
        sqlx::query("SELECT 1").execute(&store.pool).await.map_err(|e| {
            tracing::warn!("Failed to connect to database: {}", e);
            e
        })?;
        tracing::info!("Successfully connected to PostgreSQL");
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Connection pool closed");
    }
}

impl QuoteStore for PostgresStore {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        tracing::info!("Database table '{}' ensured", TABLE_NAME);
        Ok(())
    }

    async fn insert_quotes(&self, rows: &[QuoteRow]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        // Dropping the transaction on error rolls the whole batch back.
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for row in rows {
            let result = sqlx::query(INSERT_QUOTE_SQL)
                .bind(&row.name)
                .bind(&row.symbol)
                .bind(row.rank)
                .bind(row.price_usd)
                .bind(row.volume_24h_usd)
                .bind(row.market_cap_usd)
                .bind(row.last_updated)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        tracing::debug!("Committed batch: {}/{} rows inserted", inserted, rows.len());
        Ok(inserted)
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions> {
    if let Some(url) = &config.url {
        return Ok(PgConnectOptions::from_str(url)?);
    }

    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port);
    if let Some(name) = &config.name {
        options = options.database(name);
    }
    if let Some(user) = &config.user {
        options = options.username(user);
    }
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    Ok(options)
}

fn describe_target(config: &DatabaseConfig) -> String {
    match &config.url {
        Some(url) => mask_password(url),
        None => format!(
            "{}:{}/{}",
            config.host,
            config.port,
            config.name.as_deref().unwrap_or("")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discrete_config() -> DatabaseConfig {
        DatabaseConfig {
            url: None,
            host: "db.internal".to_string(),
            port: 6543,
            name: Some("markets".to_string()),
            user: Some("collector".to_string()),
            password: Some("secret".to_string()),
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn test_describe_target_never_shows_password() {
        let discrete = discrete_config();
        assert_eq!(describe_target(&discrete), "db.internal:6543/markets");

        let url = DatabaseConfig {
            url: Some("postgres://collector:secret@db:5432/markets".to_string()),
            ..discrete
        };
        assert!(!describe_target(&url).contains("secret"));
    }

    #[test]
    fn test_connect_options_from_url() {
        let config = DatabaseConfig {
            url: Some("postgres://collector:secret@db:5433/markets".to_string()),
            ..DatabaseConfig::default()
        };
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("markets"));
    }

    #[test]
    fn test_connect_options_from_fields() {
        let options = connect_options(&discrete_config()).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "collector");
    }

    #[tokio::test]
    async fn test_lazy_pool_does_not_connect() {
        // Nothing listens on this port; building the pool must still succeed.
        let config = DatabaseConfig {
            url: Some("postgres://u:p@127.0.0.1:1/none".to_string()),
            ..DatabaseConfig::default()
        };
        let store = PostgresStore::connect_lazy(&config).unwrap();
        assert_eq!(store.pool().size(), 0);
    }

    #[test]
    fn test_insert_is_idempotent_on_natural_key() {
        assert!(INSERT_QUOTE_SQL.contains("ON CONFLICT (name, symbol, last_updated) DO NOTHING"));
        assert!(CREATE_TABLE_SQL.contains("UNIQUE (name, symbol, last_updated)"));
    }
}
