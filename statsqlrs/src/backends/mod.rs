//! Database backend implementations.
//!
//! Each backend is implemented in its own file and gated behind a feature flag.
//! Backends receive SQL already rewritten to their native placeholder syntax.

use async_trait::async_trait;

use crate::error::Result;
use crate::executor::{PendingQuery, QueryResult};

/// Unified interface for all database backends.
#[async_trait]
pub trait BackendConnection: Send + Sync {
    /// Run one parameterized statement.
    async fn query_raw(&self, sql: &str, params: &[String]) -> Result<QueryResult>;

    /// Run every statement in one transaction, returning one result per statement.
    ///
    /// Either every statement is committed or none is.
    async fn transaction(&self, queries: Vec<PendingQuery>) -> Result<Vec<QueryResult>>;

    /// Release pooled connections.
    async fn close(&self) {}
}

// Feature-gated backend implementations
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "postgres")]
pub use postgres::PostgresConnection;

#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "mysql")]
pub use mysql::MySqlConnection;

/// Exact decimals become JSON integers when they are whole, floats otherwise.
#[cfg(any(feature = "postgres", feature = "mysql"))]
pub(crate) fn decimal_to_json(value: rust_decimal::Decimal) -> serde_json::Value {
    use rust_decimal::prelude::ToPrimitive;

    if value.fract().is_zero() {
        if let Some(v) = value.to_i64() {
            return serde_json::Value::from(v);
        }
    }
    value
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .unwrap_or_else(|| serde_json::Value::String(value.to_string()))
}
