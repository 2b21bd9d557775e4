//! Execution boundary between built SQL and the database backend.

use std::sync::Arc;
use std::time::Instant;

use crate::backends::BackendConnection;
use crate::config::StatsqlConfig;
use crate::dialect::{DatabaseKind, Dialect};
use crate::error::{Result, StatsqlError};
use crate::executor::{PendingQuery, QueryResult};
use crate::params::ParamList;

/// Hands finished `(sql, params)` pairs to a backend in its native syntax.
///
/// The database family is fixed at construction. A gateway built from an
/// unrecognized connection string still constructs, but every execution fails
/// with [`StatsqlError::UnknownDatabase`] before reaching the backend.
#[derive(Clone)]
pub struct QueryGateway {
    kind: Option<DatabaseKind>,
    backend: Arc<dyn BackendConnection>,
    log_queries: bool,
    slow_query_ms: u64,
}

impl QueryGateway {
    pub fn new(kind: DatabaseKind, backend: Arc<dyn BackendConnection>) -> Self {
        Self {
            kind: Some(kind),
            backend,
            log_queries: false,
            slow_query_ms: 0,
        }
    }

    pub fn from_url(url: &str, backend: Arc<dyn BackendConnection>) -> Self {
        let kind = DatabaseKind::from_url(url);
        if kind.is_none() {
            tracing::warn!("connection string does not name a supported database");
        }
        Self {
            kind,
            backend,
            log_queries: false,
            slow_query_ms: 0,
        }
    }

    pub fn from_config(config: &StatsqlConfig, backend: Arc<dyn BackendConnection>) -> Self {
        Self {
            kind: config.database_kind(),
            backend,
            log_queries: config.query.log_queries,
            slow_query_ms: config.query.slow_query_ms,
        }
    }

    pub fn with_query_logging(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    pub fn kind(&self) -> Option<DatabaseKind> {
        self.kind
    }

    /// Dialect for building fragments that will run through this gateway.
    pub fn dialect(&self) -> Result<&'static dyn Dialect> {
        self.kind
            .map(|kind| kind.dialect())
            .ok_or_else(|| StatsqlError::UnsupportedDialect("unresolved database".to_string()))
    }

    /// Run `sql` with `params`, rewriting `$N` placeholders where the backend needs it.
    pub async fn execute(&self, sql: &str, params: &ParamList) -> Result<QueryResult> {
        let dialect = self.kind.ok_or(StatsqlError::UnknownDatabase)?.dialect();
        let native = dialect.rewrite_placeholders(sql);
        tracing::trace!(sql = %native, "executing query");

        let start = Instant::now();
        let result = self.backend.query_raw(&native, params.as_slice()).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(rows) => {
                self.observe(&native, params.as_slice(), elapsed_ms);
                tracing::debug!(rows = rows.len(), ms = elapsed_ms, "query finished");
            }
            Err(e) => tracing::error!(error = %e, ms = elapsed_ms, "query failed"),
        }
        result
    }

    /// Run the queries in one backend transaction.
    pub async fn transaction(&self, queries: Vec<PendingQuery>) -> Result<Vec<QueryResult>> {
        let dialect = self.kind.ok_or(StatsqlError::UnknownDatabase)?.dialect();
        let native: Vec<PendingQuery> = queries
            .into_iter()
            .map(|q| PendingQuery {
                sql: dialect.rewrite_placeholders(&q.sql).into_owned(),
                params: q.params,
            })
            .collect();
        let count = native.len();

        let start = Instant::now();
        let result = self.backend.transaction(native).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::debug!(statements = count, ms = elapsed_ms, "transaction committed"),
            Err(e) => tracing::error!(error = %e, statements = count, "transaction failed"),
        }
        result
    }

    pub async fn close(&self) {
        self.backend.close().await;
    }

    fn observe(&self, sql: &str, params: &[String], elapsed_ms: u64) {
        if self.log_queries {
            tracing::info!(sql = %sql, params = ?params, ms = elapsed_ms, "query");
        }
        if self.slow_query_ms > 0 && elapsed_ms >= self.slow_query_ms {
            tracing::warn!(ms = elapsed_ms, threshold_ms = self.slow_query_ms, "slow query");
        }
    }
}
