use std::str::FromStr;

use anyhow::Context;
use axum::http::HeaderValue;
use sqlx::postgres::PgConnectOptions;

/// How stored passwords are compared with the submitted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordScheme {
    /// Exact string match inside the SQL query.
    Plaintext,
    /// Stored value is an Argon2 PHC string, verified in process.
    Argon2,
}

impl FromStr for PasswordScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plaintext" | "plain" => Ok(Self::Plaintext),
            "argon2" => Ok(Self::Argon2),
            other => anyhow::bail!("unknown password scheme: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

impl DbConfig {
    /// `DATABASE_URL` wins over the individual `DB_*` settings.
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return url.parse().context("parse DATABASE_URL");
        }
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db: DbConfig,
    pub host: String,
    pub port: u16,
    pub cors_origin: HeaderValue,
    pub password_scheme: PasswordScheme,
    pub seed_demo_users: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let db = DbConfig {
            url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            host: var("DB_HOST", "localhost"),
            port: parse_var(&lookup, "DB_PORT", 5432)?,
            user: var("DB_USER", "postgres"),
            password: var("DB_PASSWORD", "postgres"),
            name: var("DB_NAME", "sportomic_db"),
            max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", 10)?,
        };

        let origin = var("CORS_ORIGIN", "http://localhost:3000");
        let cors_origin = HeaderValue::from_str(&origin)
            .with_context(|| format!("invalid CORS_ORIGIN {origin:?}"))?;

        Ok(Self {
            db,
            host: var("APP_HOST", "0.0.0.0"),
            port: parse_var(&lookup, "PORT", 5000)?,
            cors_origin,
            password_scheme: parse_var(&lookup, "PASSWORD_SCHEME", PasswordScheme::Plaintext)?,
            seed_demo_users: parse_var(&lookup, "SEED_DEMO_USERS", false)?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key} {raw:?}: {e}")),
        _ => Ok(default),
    }
}
