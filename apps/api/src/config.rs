use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::resumes::DEFAULT_MAX_BYTES;

/// Which backing store to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Networked store when configured, embedded file otherwise or on failure.
    Auto,
    Postgres,
    Sqlite,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(StorageBackend::Auto),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!(
                "unknown storage backend '{other}' (expected auto, postgres, sqlite or memory)"
            )),
        }
    }
}

/// A credential that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Connection settings for the networked store.
#[derive(Clone, PartialEq, Eq)]
pub enum NetworkStoreConfig {
    Url(String),
    Parts {
        host: String,
        port: u16,
        username: String,
        password: Secret,
        database: String,
        application_name: Option<String>,
    },
}

impl fmt::Debug for NetworkStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // URLs can embed a password.
            NetworkStoreConfig::Url(_) => f.write_str("Url(***)"),
            NetworkStoreConfig::Parts {
                host,
                port,
                username,
                database,
                application_name,
                ..
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("username", username)
                .field("database", database)
                .field("application_name", application_name)
                .finish_non_exhaustive(),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Connection credentials have no defaults; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub storage_backend: StorageBackend,
    pub network: Option<NetworkStoreConfig>,
    pub db_max_connections: u32,
    pub db_connect_timeout: Duration,
    pub sqlite_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_resume_bytes: usize,
    pub allow_duplicate_registrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        Ok(Config {
            port: env.parse_or("PORT", 8080)?,
            rust_log: env.get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            storage_backend: env.parse_or("STORAGE_BACKEND", StorageBackend::Auto)?,
            network: network_config(&env)?,
            db_max_connections: env.parse_or("DB_MAX_CONNECTIONS", 10)?,
            db_connect_timeout: Duration::from_secs(env.parse_or("DB_CONNECT_TIMEOUT_SECS", 5)?),
            sqlite_path: env
                .get("SQLITE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("jobseekers.db")),
            upload_dir: env
                .get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_resume_bytes: env.parse_or("MAX_RESUME_BYTES", DEFAULT_MAX_BYTES)?,
            allow_duplicate_registrations: env
                .get("ALLOW_DUPLICATE_REGISTRATIONS")
                .map(|v| parse_bool("ALLOW_DUPLICATE_REGISTRATIONS", &v))
                .transpose()?
                .unwrap_or(true),
        })
    }
}

fn network_config<F>(env: &Env<F>) -> Result<Option<NetworkStoreConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env.get("DATABASE_URL") {
        return Ok(Some(NetworkStoreConfig::Url(url)));
    }
    let Some(host) = env.get("DB_HOST") else {
        return Ok(None);
    };

    Ok(Some(NetworkStoreConfig::Parts {
        host,
        port: env.parse_or("DB_PORT", 5432)?,
        username: env.require("DB_USER")?,
        password: Secret::new(env.require("DB_PASSWORD")?),
        database: env.require("DB_NAME")?,
        application_name: env.get("DB_APPLICATION_NAME"),
    }))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{key} must be true or false, got '{value}'"),
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.get(key)
            .with_context(|| format!("Required environment variable '{key}' is not set"))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| anyhow!("{key} has an invalid value '{raw}': {e}")),
            None => Ok(default),
        }
    }
}
