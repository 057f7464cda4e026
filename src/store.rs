use anyhow::Context;
use axum::async_trait;
use serde_json::{Map, Value};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    Column, PgPool, Row as _, TypeInfo,
};
use tracing::{debug, info};

use crate::config::DbConfig;

/// One result row: column name to value.
pub type Row = Map<String, Value>;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Runs `statement` with `args` bound to `$1..$n` in order.
    async fn query(&self, statement: &str, args: &[&str]) -> anyhow::Result<Vec<Row>>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(cfg: &DbConfig) -> anyhow::Result<Self> {
        let options = cfg.connect_options()?;
        info!(
            host = options.get_host(),
            port = options.get_port(),
            database = options.get_database().unwrap_or_default(),
            "connecting to database"
        );
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .connect_with(options)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Waits for checked-out connections to return, then closes them all.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn query(&self, statement: &str, args: &[&str]) -> anyhow::Result<Vec<Row>> {
        let mut query = sqlx::query(statement);
        for arg in args {
            query = query.bind(*arg);
        }
        let rows = query.fetch_all(&self.pool).await.context("run query")?;
        debug!(rows = rows.len(), "query finished");
        rows.iter().map(decode_row).collect()
    }
}

fn decode_row(row: &PgRow) -> anyhow::Result<Row> {
    let mut out = Row::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let type_name = column.type_info().name().to_ascii_uppercase();
        let value = match type_name.as_str() {
            "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(Value::from),
            "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(Value::from),
            "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::from),
            "FLOAT4" => row.try_get::<Option<f32>, _>(idx)?.map(Value::from),
            "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(Value::from),
            "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::from),
            "TEXT" | "VARCHAR" | "CHAR" | "NAME" => {
                row.try_get::<Option<String>, _>(idx)?.map(Value::from)
            }
            // citext is an extension type; its wire format is plain text.
            "CITEXT" => row
                .try_get_unchecked::<Option<String>, _>(idx)?
                .map(Value::from),
            "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx)?,
            other => anyhow::bail!("unsupported column type {other} for {}", column.name()),
        };
        out.insert(column.name().to_string(), value.unwrap_or(Value::Null));
    }
    Ok(out)
}
