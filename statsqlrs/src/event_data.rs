//! Aggregate columns and equality filters over a JSON event-data column.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dialect::Dialect;

/// Aggregate applied to a JSON property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Count => "count",
        }
    }

    /// Whether the property has to be read as a number for this aggregate.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Aggregate::Sum | Aggregate::Avg | Aggregate::Min | Aggregate::Max
        )
    }
}

/// Render `fn(property) as "fn(property)"` for every property with an aggregate.
///
/// Columns come out in iteration order, separated by `,\n`. Properties mapped
/// to `None` are skipped.
pub fn build_columns<K, I>(dialect: &dyn Dialect, column: &str, columns: I) -> String
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, Option<Aggregate>)>,
{
    let rendered: Vec<String> = columns
        .into_iter()
        .filter_map(|(property, agg)| {
            let agg = agg?;
            let property = property.as_ref();
            let accessor = dialect.json_field(column, property, agg.is_numeric());
            Some(format!(
                "{name}({accessor}) as \"{name}({property})\"",
                name = agg.as_str()
            ))
        })
        .collect();
    rendered.join(",\n")
}

/// Render `property = literal` for every property with a value, joined by `and`.
///
/// Numbers compare against a numeric read of the property; everything else is
/// written as a quoted string literal. `null` values are skipped.
pub fn build_filters<'a, K, I>(dialect: &dyn Dialect, column: &str, filters: I) -> String
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, &'a Value)>,
{
    let rendered: Vec<String> = filters
        .into_iter()
        .filter_map(|(property, value)| {
            let property = property.as_ref();
            let (as_number, literal) = match value {
                Value::Null => return None,
                Value::Number(n) => (true, n.to_string()),
                Value::String(s) => (false, quote(s)),
                other => (false, quote(&other.to_string())),
            };
            let accessor = dialect.json_field(column, property, as_number);
            Some(format!("{accessor} = {literal}"))
        })
        .collect();
    rendered.join("\nand ")
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect};

    #[test]
    fn builds_aggregate_columns_in_order() {
        let sql = build_columns(
            &PostgresDialect,
            "event_data",
            [
                ("amount", Some(Aggregate::Sum)),
                ("skipped", None),
                ("plan", Some(Aggregate::Count)),
            ],
        );
        assert_eq!(
            sql,
            "sum(CAST(event_data ->> 'amount' AS DECIMAL)) as \"sum(amount)\",\n\
             count(event_data ->> 'plan') as \"count(plan)\""
        );
    }

    #[test]
    fn mysql_aggregate_columns_read_paths() {
        let sql = build_columns(
            &MySqlDialect,
            "event_data",
            vec![("amount".to_string(), Some(Aggregate::Avg))],
        );
        assert_eq!(sql, "avg(event_data ->> \"$.amount\") as \"avg(amount)\"");
    }

    #[test]
    fn no_columns_renders_nothing() {
        let none: [(&str, Option<Aggregate>); 0] = [];
        assert_eq!(build_columns(&PostgresDialect, "event_data", none), "");
    }

    #[test]
    fn builds_typed_equality_filters() {
        let filters = json!({ "plan": "pro", "seats": 3, "coupon": null });
        let map = filters.as_object().unwrap();
        let sql = build_filters(&PostgresDialect, "event_data", map.iter());
        assert!(sql.contains("CAST(event_data ->> 'seats' AS DECIMAL) = 3"));
        assert!(sql.contains("event_data ->> 'plan' = 'pro'"));
        assert!(sql.contains("\nand "));
        assert!(!sql.contains("coupon"));
    }

    #[test]
    fn escapes_quotes_in_string_literals() {
        let value = json!("o'brien");
        let sql = build_filters(&MySqlDialect, "event_data", [("name", &value)]);
        assert_eq!(sql, "event_data ->> \"$.name\" = 'o''brien'");
    }
}
