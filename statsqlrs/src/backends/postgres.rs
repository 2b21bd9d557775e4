//! PostgreSQL backend implementation.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tokio_postgres::types::{FromSql, ToSql, Type};

use crate::config::PoolConfig;
use crate::error::{Result, StatsqlError};
use crate::executor::{ColumnMeta, PendingQuery, QueryResult};

use super::{decimal_to_json, BackendConnection};

pub struct PostgresConnection {
    pool: deadpool_postgres::Pool,
}

impl PostgresConnection {
    /// Create a connection pool from a `postgresql://` URL.
    ///
    /// Connections are opened lazily on first use.
    pub fn open(url: &str, pool_config: &PoolConfig) -> Result<Self> {
        tracing::info!(max_size = pool_config.size, "creating PostgreSQL connection pool");

        let mut cfg = deadpool_postgres::Config::new();
        cfg.url = Some(url.to_string());
        cfg.pool = Some(deadpool_postgres::PoolConfig::new(pool_config.size));
        if pool_config.statement_timeout_ms > 0 {
            cfg.options = Some(format!(
                "-c statement_timeout={}",
                pool_config.statement_timeout_ms
            ));
        }

        let pool = cfg
            .create_pool(
                Some(deadpool_postgres::Runtime::Tokio1),
                tokio_postgres::NoTls,
            )
            .map_err(|e| {
                tracing::error!(error = %e, "failed to create PostgreSQL pool");
                StatsqlError::Execution(format!("create postgres pool: {e}"))
            })?;

        Ok(Self { pool })
    }

    async fn client(&self) -> Result<deadpool_postgres::Object> {
        let pool_status = self.pool.status();
        tracing::debug!(
            available = pool_status.available,
            size = pool_status.size,
            max_size = pool_status.max_size,
            "acquiring PostgreSQL connection"
        );
        self.pool.get().await.map_err(|e| {
            tracing::error!(error = %e, "failed to get PostgreSQL connection");
            StatsqlError::Execution(format!("get postgres connection: {e}"))
        })
    }
}

#[async_trait]
impl BackendConnection for PostgresConnection {
    async fn query_raw(&self, sql: &str, params: &[String]) -> Result<QueryResult> {
        let start = Instant::now();
        let client = self.client().await?;

        // Every parameter is bound as text; `Dialect::param_cast` suffixes pick the column type.
        let types = vec![Type::TEXT; params.len()];
        let stmt = client
            .prepare_typed_cached(sql, &types)
            .await
            .map_err(|e| StatsqlError::Execution(format!("prepare query: {e}")))?;
        let rows = client
            .query(&stmt, &bind_refs(params))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "PostgreSQL query execution failed");
                StatsqlError::Execution(format!("execute query: {e}"))
            })?;

        let result = rows_to_result(&rows);
        tracing::debug!(
            rows = result.rows.len(),
            columns = result.columns.len(),
            ms = start.elapsed().as_millis(),
            "postgres query_raw"
        );
        Ok(result)
    }

    async fn transaction(&self, queries: Vec<PendingQuery>) -> Result<Vec<QueryResult>> {
        let mut client = self.client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| StatsqlError::Execution(format!("begin transaction: {e}")))?;

        let mut results = Vec::with_capacity(queries.len());
        for query in &queries {
            let types = vec![Type::TEXT; query.params.len()];
            let stmt = tx
                .prepare_typed(&query.sql, &types)
                .await
                .map_err(|e| StatsqlError::Execution(format!("prepare query: {e}")))?;
            let rows = tx
                .query(&stmt, &bind_refs(&query.params))
                .await
                .map_err(|e| StatsqlError::Execution(format!("execute query: {e}")))?;
            results.push(rows_to_result(&rows));
        }

        tx.commit()
            .await
            .map_err(|e| StatsqlError::Execution(format!("commit transaction: {e}")))?;
        Ok(results)
    }

    async fn close(&self) {
        tracing::info!("closing PostgreSQL connection pool");
        self.pool.close();
    }
}

fn bind_refs(params: &[String]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

fn rows_to_result(rows: &[tokio_postgres::Row]) -> QueryResult {
    let columns = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|col| ColumnMeta {
                    name: col.name().to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let rows = rows
        .iter()
        .map(|row| {
            let mut map = serde_json::Map::new();
            for (idx, col) in row.columns().iter().enumerate() {
                map.insert(col.name().to_string(), pg_value_to_json(row, idx, col));
            }
            map
        })
        .collect();

    QueryResult { columns, rows }
}

/// Convert a PostgreSQL value to JSON.
fn pg_value_to_json(
    row: &tokio_postgres::Row,
    idx: usize,
    col: &tokio_postgres::Column,
) -> serde_json::Value {
    use serde_json::Value;

    match col.type_() {
        &Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        &Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        &Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        &Type::INT8 => row
            .try_get::<_, Option<i64>>(idx)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        &Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .ok()
            .flatten()
            .and_then(|v| serde_json::Number::from_f64(v as f64).map(Value::Number))
            .unwrap_or(Value::Null),
        &Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)
            .ok()
            .flatten()
            .and_then(|v| serde_json::Number::from_f64(v).map(Value::Number))
            .unwrap_or(Value::Null),
        &Type::NUMERIC => match row.try_get::<_, Option<NumericValue>>(idx) {
            Ok(Some(NumericValue::Finite(v))) => decimal_to_json(v),
            Ok(Some(NumericValue::Special(word))) => Value::String(word.to_string()),
            Ok(None) => Value::Null,
            Err(e) => {
                tracing::warn!(column = col.name(), error = %e, "failed to decode NUMERIC");
                Value::Null
            }
        },
        &Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_rfc3339()))
            .unwrap_or(Value::Null),
        &Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.and_utc().to_rfc3339()))
            .unwrap_or(Value::Null),
        &Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        &Type::UUID => row
            .try_get::<_, Option<uuid::Uuid>>(idx)
            .ok()
            .flatten()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        // Aggregates over `->>` text (`to_char`, json fields) come back as text.
        _ => row
            .try_get::<_, Option<String>>(idx)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// NUMERIC value, keeping the special values `Decimal` cannot represent.
#[derive(Debug, PartialEq)]
enum NumericValue {
    Finite(Decimal),
    Special(&'static str),
}

impl<'a> FromSql<'a> for NumericValue {
    fn from_sql(
        ty: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        // The sign word sits after ndigits and weight.
        match raw.get(4..6) {
            Some([0xC0, 0x00]) => Ok(NumericValue::Special("NaN")),
            Some([0xD0, 0x00]) => Ok(NumericValue::Special("Infinity")),
            Some([0xF0, 0x00]) => Ok(NumericValue::Special("-Infinity")),
            _ => Decimal::from_sql(ty, raw).map(NumericValue::Finite),
        }
    }

    fn accepts(ty: &Type) -> bool {
        <Decimal as FromSql>::accepts(ty)
    }
}
