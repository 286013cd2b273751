//! Database layer for flock.
//!
//! Entities, migrations and repositories shared by every service. Each
//! service connects to the same `PostgreSQL` database and only touches the
//! tables it owns.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use flock_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Key of the advisory lock serializing migrations across services.
const MIGRATION_LOCK_KEY: i64 = 0x666c_6f63_6b;

/// Run pending migrations.
///
/// Runs in a transaction holding a Postgres advisory lock; concurrent
/// callers wait for the first one to finish.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm::{ConnectionTrait, TransactionTrait};
    use sea_orm_migration::MigratorTrait;

    let txn = db
        .begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    txn.execute_unprepared(&format!("SELECT pg_advisory_xact_lock({MIGRATION_LOCK_KEY})"))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    migrations::Migrator::up(&txn, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    txn.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
