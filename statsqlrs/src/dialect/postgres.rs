//! PostgreSQL dialect implementation.

use std::borrow::Cow;

use crate::error::Result;

use super::{parse_timezone, DatabaseKind, Dialect, ParamType, TimeUnit};

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Postgres
    }

    fn placeholder(&self, idx: usize) -> String {
        format!("${}", idx + 1) // PostgreSQL uses $1, $2, ...
    }

    fn rewrite_placeholders<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(sql)
    }

    fn date_format(&self, unit: TimeUnit) -> &'static str {
        match unit {
            TimeUnit::Minute => "YYYY-MM-DD HH24:MI:00",
            TimeUnit::Hour => "YYYY-MM-DD HH24:00:00",
            TimeUnit::Day => "YYYY-MM-DD",
            TimeUnit::Month => "YYYY-MM-01",
            TimeUnit::Year => "YYYY-01-01",
        }
    }

    fn date_trunc(&self, field: &str, unit: TimeUnit, timezone: Option<&str>) -> Result<String> {
        let source = match timezone {
            Some(tz) => {
                let tz = parse_timezone(tz)?;
                format!("{field} at time zone '{}'", tz.name())
            }
            None => field.to_string(),
        };
        Ok(format!(
            "to_char(date_trunc('{}', {source}), '{}')",
            unit.as_str(),
            self.date_format(unit)
        ))
    }

    fn seconds_between(&self, field: &str) -> String {
        format!("floor(extract(epoch from max({field}) - min({field})))")
    }

    fn json_field(&self, column: &str, property: &str, as_number: bool) -> String {
        let accessor = format!("{column} ->> '{property}'");
        if as_number {
            format!("CAST({accessor} AS DECIMAL)")
        } else {
            accessor
        }
    }

    fn param_cast(&self, ty: ParamType) -> &'static str {
        match ty {
            ParamType::Text => "",
            ParamType::Uuid => "::uuid",
            ParamType::Timestamp => "::timestamptz",
            ParamType::Integer => "::bigint",
            ParamType::Decimal => "::numeric",
        }
    }
}
