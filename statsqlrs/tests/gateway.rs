//! Integration tests for the query gateway.
//!
//! A recording backend stands in for the database so the tests can see exactly
//! which SQL and parameters reach it.

use std::sync::{Arc, Mutex};

use statsql::backends::BackendConnection;
use statsql::error::Result;
use statsql::{
    DatabaseKind, ParamList, PendingQuery, QueryGateway, QueryResult, StatsqlConfig, StatsqlError,
};

#[derive(Default)]
struct RecordingConnection {
    queries: Mutex<Vec<(String, Vec<String>)>>,
    transactions: Mutex<Vec<Vec<PendingQuery>>>,
    fail: bool,
}

impl RecordingConnection {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn queries(&self) -> Vec<(String, Vec<String>)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BackendConnection for RecordingConnection {
    async fn query_raw(&self, sql: &str, params: &[String]) -> Result<QueryResult> {
        self.queries
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        if self.fail {
            return Err(StatsqlError::Execution("connection refused".to_string()));
        }
        let mut row = serde_json::Map::new();
        row.insert("x".to_string(), serde_json::json!(1));
        Ok(QueryResult {
            columns: vec![],
            rows: vec![row],
        })
    }

    async fn transaction(&self, queries: Vec<PendingQuery>) -> Result<Vec<QueryResult>> {
        let count = queries.len();
        self.transactions.lock().unwrap().push(queries);
        Ok(vec![QueryResult::default(); count])
    }
}

fn params(values: &[&str]) -> ParamList {
    values.iter().copied().collect()
}

#[tokio::test]
async fn mysql_placeholders_are_rewritten_in_order() {
    let conn = Arc::new(RecordingConnection::default());
    let gateway = QueryGateway::new(DatabaseKind::MySql, conn.clone());

    gateway
        .execute("select * from t where a=$1 and b=$2", &params(&["1", "2"]))
        .await
        .unwrap();

    assert_eq!(
        conn.queries(),
        vec![(
            "select * from t where a=? and b=?".to_string(),
            vec!["1".to_string(), "2".to_string()]
        )]
    );
}

#[tokio::test]
async fn postgres_sql_is_forwarded_untouched() {
    let conn = Arc::new(RecordingConnection::default());
    let gateway = QueryGateway::from_url("postgresql://localhost/analytics", conn.clone());

    let result = gateway
        .execute("select $1::uuid", &params(&["4f1c"]))
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(conn.queries()[0].0, "select $1::uuid");
}

#[tokio::test]
async fn unknown_database_never_reaches_backend() {
    let conn = Arc::new(RecordingConnection::default());
    let gateway = QueryGateway::from_url("mongodb://localhost/x", conn.clone());

    let err = gateway
        .execute("select 1", &ParamList::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StatsqlError::UnknownDatabase));

    let err = gateway
        .transaction(vec![PendingQuery::new("select 1", ParamList::new())])
        .await
        .unwrap_err();
    assert!(matches!(err, StatsqlError::UnknownDatabase));

    assert!(conn.queries().is_empty());
    assert!(conn.transactions.lock().unwrap().is_empty());
    assert!(matches!(
        gateway.dialect(),
        Err(StatsqlError::UnsupportedDialect(_))
    ));
}

#[tokio::test]
async fn backend_errors_are_returned_unchanged() {
    let conn = Arc::new(RecordingConnection::failing());
    let gateway = QueryGateway::new(DatabaseKind::Postgres, conn.clone());

    let err = gateway
        .execute("select 1", &ParamList::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StatsqlError::Execution(msg) if msg == "connection refused"));
    assert_eq!(conn.queries().len(), 1);
}

#[tokio::test]
async fn transaction_rewrites_each_statement() {
    let conn = Arc::new(RecordingConnection::default());
    let gateway = QueryGateway::new(DatabaseKind::MySql, conn.clone());

    let results = gateway
        .transaction(vec![
            PendingQuery::new("delete from event where website_id=$1", params(&["w"])),
            PendingQuery::new("delete from website where website_id=$1", params(&["w"])),
        ])
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    let recorded = conn.transactions.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0][0].sql, "delete from event where website_id=?");
    assert_eq!(recorded[0][1].sql, "delete from website where website_id=?");
    assert_eq!(recorded[0][1].params, vec!["w".to_string()]);
}

#[tokio::test]
async fn gateway_from_config_uses_configured_url() {
    let mut config = StatsqlConfig::from_toml(
        "[database]\nurl = \"mysql://root@localhost/analytics\"\n[query]\nlog_queries = true",
    )
    .unwrap();
    config.apply_env(|_| None);

    let conn = Arc::new(RecordingConnection::default());
    let gateway = QueryGateway::from_config(&config, conn.clone());
    assert_eq!(gateway.kind(), Some(DatabaseKind::MySql));

    gateway
        .execute("select $1", &params(&["a"]))
        .await
        .unwrap();
    assert_eq!(conn.queries()[0].0, "select ?");
    gateway.close().await;
}
