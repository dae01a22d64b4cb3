use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{PgPool, SqlitePool};
use tracing::info;

use crate::config::NetworkStoreConfig;

/// The `*_key` columns hold `fold_case` copies of the searchable fields.
const PG_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS jobseekers (
        id               BIGSERIAL PRIMARY KEY,
        full_name        TEXT NOT NULL,
        contact_number   TEXT NOT NULL,
        email            TEXT NOT NULL,
        gender           TEXT NOT NULL,
        age              INTEGER NOT NULL,
        skill            TEXT NOT NULL,
        experience       TEXT NOT NULL,
        location         TEXT NOT NULL,
        resume_file_name TEXT NOT NULL,
        resume_file_path TEXT NOT NULL,
        status           TEXT NOT NULL DEFAULT 'active',
        created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        full_name_key    TEXT NOT NULL,
        email_key        TEXT NOT NULL,
        location_key     TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_jobseekers_skill ON jobseekers (skill)",
    "CREATE INDEX IF NOT EXISTS idx_jobseekers_experience ON jobseekers (experience)",
    "CREATE INDEX IF NOT EXISTS idx_jobseekers_email_key ON jobseekers (email_key)",
    "CREATE INDEX IF NOT EXISTS idx_jobseekers_created_at ON jobseekers (created_at)",
];

const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS jobseekers (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        full_name        TEXT NOT NULL,
        contact_number   TEXT NOT NULL,
        email            TEXT NOT NULL,
        gender           TEXT NOT NULL,
        age              INTEGER NOT NULL,
        skill            TEXT NOT NULL,
        experience       TEXT NOT NULL,
        location         TEXT NOT NULL,
        resume_file_name TEXT NOT NULL,
        resume_file_path TEXT NOT NULL,
        status           TEXT NOT NULL DEFAULT 'active',
        created_at       TEXT NOT NULL,
        full_name_key    TEXT NOT NULL,
        email_key        TEXT NOT NULL,
        location_key     TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_jobseekers_skill ON jobseekers (skill)",
    "CREATE INDEX IF NOT EXISTS idx_jobseekers_experience ON jobseekers (experience)",
    "CREATE INDEX IF NOT EXISTS idx_jobseekers_email_key ON jobseekers (email_key)",
    "CREATE INDEX IF NOT EXISTS idx_jobseekers_created_at ON jobseekers (created_at)",
];

/// Connection options for the networked store. A full URL wins over parts.
pub fn pg_connect_options(network: &NetworkStoreConfig) -> Result<PgConnectOptions> {
    let options = match network {
        NetworkStoreConfig::Url(url) => {
            PgConnectOptions::from_str(url).context("DATABASE_URL is not a valid PostgreSQL URL")?
        }
        NetworkStoreConfig::Parts {
            host,
            port,
            username,
            password,
            database,
            application_name,
        } => {
            let options = PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(username)
                .password(password.expose())
                .database(database);
            match application_name {
                Some(name) => options.application_name(name),
                None => options,
            }
        }
    };
    Ok(options)
}

/// Creates a PostgreSQL pool and makes sure the schema exists.
pub async fn create_pg_pool(
    network: &NetworkStoreConfig,
    max_connections: u32,
    connect_timeout: Duration,
) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(connect_timeout)
        .connect_with(pg_connect_options(network)?)
        .await
        .context("Failed to connect to PostgreSQL")?;

    for statement in PG_SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .context("Failed to create PostgreSQL schema")?;
    }

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Opens (creating if missing) the embedded SQLite file and its schema.
pub async fn create_sqlite_pool(path: &Path, max_connections: u32) -> Result<SqlitePool> {
    info!(path = %path.display(), "Opening SQLite database...");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open SQLite database {}", path.display()))?;

    for statement in SQLITE_SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .context("Failed to create SQLite schema")?;
    }

    info!("SQLite connection pool established");
    Ok(pool)
}
