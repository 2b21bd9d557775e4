//! MySQL backend implementation.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row};

use crate::config::PoolConfig;
use crate::error::{Result, StatsqlError};
use crate::executor::{ColumnMeta, PendingQuery, QueryResult};

use super::{decimal_to_json, BackendConnection};

pub struct MySqlConnection {
    pool: MySqlPool,
}

impl MySqlConnection {
    /// Connect a pool to a `mysql://` URL.
    pub async fn open(url: &str, pool_config: &PoolConfig) -> Result<Self> {
        tracing::info!(max_size = pool_config.size, "creating MySQL connection pool");
        let pool = MySqlPoolOptions::new()
            .max_connections(pool_config.size as u32)
            .connect(url)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to connect to MySQL");
                StatsqlError::Execution(format!("connect mysql: {e}"))
            })?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BackendConnection for MySqlConnection {
    async fn query_raw(&self, sql: &str, params: &[String]) -> Result<QueryResult> {
        let start = Instant::now();
        tracing::debug!(
            size = self.pool.size(),
            idle = self.pool.num_idle(),
            "acquiring MySQL connection"
        );

        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(param.as_str());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "MySQL query execution failed");
            StatsqlError::Execution(format!("execute query: {e}"))
        })?;

        let result = rows_to_result(&rows);
        tracing::debug!(
            rows = result.rows.len(),
            columns = result.columns.len(),
            ms = start.elapsed().as_millis(),
            "mysql query_raw"
        );
        Ok(result)
    }

    async fn transaction(&self, queries: Vec<PendingQuery>) -> Result<Vec<QueryResult>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StatsqlError::Execution(format!("begin transaction: {e}")))?;

        let mut results = Vec::with_capacity(queries.len());
        for pending in &queries {
            let mut query = sqlx::query(&pending.sql);
            for param in &pending.params {
                query = query.bind(param.as_str());
            }
            let rows = query
                .fetch_all(&mut *tx)
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
        tracing::info!("closing MySQL connection pool");
        self.pool.close().await;
    }
}

fn rows_to_result(rows: &[MySqlRow]) -> QueryResult {
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
            for col in row.columns() {
                map.insert(col.name().to_string(), mysql_value_to_json(row, col.ordinal()));
            }
            map
        })
        .collect();

    QueryResult { columns, rows }
}

/// Convert a MySQL value to JSON, trying the common types in order.
fn mysql_value_to_json(row: &MySqlRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return v.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Decimal>, _>(idx) {
        return v.map(decimal_to_json).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    // TIMESTAMP and DATETIME; MySQL stores no zone, values are read as UTC.
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        return v
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return v
            .map(|dt| Value::String(dt.and_utc().to_rfc3339()))
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return v
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null);
    }
    match row.try_get::<Option<String>, _>(idx) {
        Ok(v) => v.map(Value::String).unwrap_or(Value::Null),
        Err(e) => {
            tracing::warn!(column = idx, error = %e, "unsupported MySQL column type");
            Value::Null
        }
    }
}
