//! Query logging through the gateway, observed with a capturing subscriber.

use std::io::Write;
use std::sync::{Arc, Mutex};

use statsql::backends::BackendConnection;
use statsql::error::Result;
use statsql::{DatabaseKind, ParamList, PendingQuery, QueryGateway, QueryResult};

struct EmptyConnection;

#[async_trait::async_trait]
impl BackendConnection for EmptyConnection {
    async fn query_raw(&self, _sql: &str, _params: &[String]) -> Result<QueryResult> {
        Ok(QueryResult::default())
    }

    async fn transaction(&self, queries: Vec<PendingQuery>) -> Result<Vec<QueryResult>> {
        Ok(vec![QueryResult::default(); queries.len()])
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

async fn run_logged(gateway: &QueryGateway) -> String {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let params: ParamList = ["/pricing"].into_iter().collect();
    gateway
        .execute("select count(*) from pageview where url=$1", &params)
        .await
        .unwrap();
    buffer.contents()
}

#[tokio::test]
async fn logs_each_query_when_enabled() {
    let gateway = QueryGateway::new(DatabaseKind::MySql, Arc::new(EmptyConnection))
        .with_query_logging(true);

    let output = run_logged(&gateway).await;
    assert!(output.contains(" INFO "), "output: {output}");
    assert!(output.contains("select count(*) from pageview where url=?"));
    assert!(output.contains("/pricing"));
}

#[tokio::test]
async fn stays_quiet_when_disabled() {
    let gateway = QueryGateway::new(DatabaseKind::MySql, Arc::new(EmptyConnection))
        .with_query_logging(false);

    let output = run_logged(&gateway).await;
    assert!(!output.contains("pageview"), "output: {output}");
}
