use serde_json::{Map, Value};

use crate::params::ParamList;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub name: String,
}

/// Rows returned by a backend, each row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Map<String, Value>>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A statement waiting to run as part of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub sql: String,
    pub params: Vec<String>,
}

impl PendingQuery {
    pub fn new(sql: impl Into<String>, params: ParamList) -> Self {
        Self {
            sql: sql.into(),
            params: params.into_vec(),
        }
    }
}
