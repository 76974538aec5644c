#![cfg(test)]
use std::time::Duration;

use configs::DatabaseConfig;
use migration::MigratorTrait;
use models::db::connect_with_config;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// Migrations run once per test process; `false` means the database is unusable
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn test_config() -> Option<DatabaseConfig> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let url = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty())?;
    Some(DatabaseConfig {
        url,
        min_connections: 1,
        acquire_timeout_secs: 10,
        ..DatabaseConfig::default()
    })
}

/// Connection to a migrated test database, or `None` when none is configured.
pub async fn get_db() -> Option<DatabaseConnection> {
    let cfg = test_config()?;

    let migrated = MIGRATED
        .get_or_init(|| async {
            let Ok(db) = connect_with_config(&cfg).await else { return false };
            let ok = migration::Migrator::up(&db, None).await.is_ok();
            drop(db);
            ok
        })
        .await;
    if !migrated {
        return None;
    }

    // fresh pool for the current test's runtime
    tokio::time::timeout(Duration::from_secs(15), connect_with_config(&cfg))
        .await
        .ok()?
        .ok()
}
