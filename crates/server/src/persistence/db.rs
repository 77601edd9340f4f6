//! Database connection and initialization (§10.4).
//!
//! SQLite via an async `sqlx` pool, opened in WAL journal mode with
//! `synchronous=NORMAL` and a busy timeout equal to the store's write-lock
//! timeout, so a second OS process contending for the same database file
//! backs off the same way an in-process writer does.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

/// Busy-wait bound for lock acquisition (§5 default).
pub const STORE_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Database connection wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Initialize the SQLite database: create the file if missing, run
/// migrations, and return a connection pool in WAL mode.
pub async fn init_database(db_path: &str, max_connections: u32) -> Result<Database> {
    if db_path != ":memory:" {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    info!("connecting to database: {}", db_path);

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(STORE_LOCK_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(Database { pool })
}

/// Apply the embedded migration, tolerating "already exists" on repeated
/// boot and failing fast on any other migration error.
async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let migration_sql = include_str!("../../migrations/001_init.sql");
    info!("running database migrations");

    for statement in migration_sql.split(';') {
        let statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }

        if let Err(err) = sqlx::query(statement).execute(pool).await {
            let err_str = err.to_string();
            if err_str.contains("already exists") {
                continue;
            }
            anyhow::bail!("migration failed on statement {:?}: {}", statement, err);
        }
    }

    info!("database migrations complete");
    Ok(())
}
