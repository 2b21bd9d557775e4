//! SQL dialect abstractions for the supported database families.
//!
//! Each dialect lives in its own file. Fragment builders never branch on the
//! database themselves; they receive a `&dyn Dialect` and ask it for the
//! dialect-specific pieces.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsqlError};

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[0-9]+").expect("placeholder regex is valid"));

/// The database families this crate can render SQL for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Postgres,
    #[serde(rename = "mysql")]
    MySql,
}

impl DatabaseKind {
    /// Resolve the database family from a connection string.
    ///
    /// Returns `None` for anything that is not a recognized scheme; callers
    /// decide which error that becomes.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.trim().split_once("://")?.0.to_ascii_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Some(DatabaseKind::Postgres),
            "mysql" => Some(DatabaseKind::MySql),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::Postgres => "postgresql",
            DatabaseKind::MySql => "mysql",
        }
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            DatabaseKind::Postgres => &PostgresDialect,
            DatabaseKind::MySql => &MySqlDialect,
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granularity a timestamp is bucketed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 5] = [
        TimeUnit::Minute,
        TimeUnit::Hour,
        TimeUnit::Day,
        TimeUnit::Month,
        TimeUnit::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Minute => "minute",
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
            TimeUnit::Month => "month",
            TimeUnit::Year => "year",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = StatsqlError;

    fn from_str(s: &str) -> Result<Self> {
        TimeUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == s)
            .ok_or_else(|| StatsqlError::InvalidTimeUnit(s.to_string()))
    }
}

/// Column type a text-bound parameter is compared against.
///
/// Backends bind every parameter as text; a cast suffix after the placeholder
/// (`$2::timestamptz`) lets engines without implicit text coercion compare it
/// to typed columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Text,
    Uuid,
    Timestamp,
    Integer,
    Decimal,
}

/// Dialects render the database-specific pieces of an analytics query.
///
/// Composition (filter clauses, aggregate column lists) lives outside the
/// dialect; the dialect only maps logical constructs to SQL text.
///
/// Column and property names are written into the SQL text verbatim. Only pass
/// identifiers drawn from a closed set the application controls.
pub trait Dialect: Send + Sync {
    fn kind(&self) -> DatabaseKind;

    /// Native positional placeholder for the zero-based parameter `idx`.
    fn placeholder(&self, idx: usize) -> String;

    /// Rewrite `$1, $2, ...` placeholders to the native syntax, in textual order.
    ///
    /// Expects placeholders to appear ascending and contiguous.
    fn rewrite_placeholders<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        let mut idx = 0;
        PLACEHOLDER_RE.replace_all(sql, |_: &Captures<'_>| {
            let native = self.placeholder(idx);
            idx += 1;
            native
        })
    }

    /// Format pattern producing the text form of a timestamp bucketed to `unit`.
    fn date_format(&self, unit: TimeUnit) -> &'static str;

    /// Bucket `field` to `unit`, optionally shifted into `timezone`, rendered as text.
    fn date_trunc(&self, field: &str, unit: TimeUnit, timezone: Option<&str>) -> Result<String>;

    /// Whole seconds between `max(field)` and `min(field)`.
    fn seconds_between(&self, field: &str) -> String;

    /// Extract `property` from the JSON `column`.
    fn json_field(&self, column: &str, property: &str, as_number: bool) -> String;

    /// Suffix casting a bound text parameter to `ty`.
    fn param_cast(&self, ty: ParamType) -> &'static str;

    /// Suffix casting a bound text parameter to a UUID column type.
    fn uuid_cast(&self) -> &'static str {
        self.param_cast(ParamType::Uuid)
    }
}

/// Resolve the dialect for a connection string.
pub fn resolve_dialect(url: &str) -> Result<&'static dyn Dialect> {
    match DatabaseKind::from_url(url) {
        Some(kind) => {
            tracing::debug!(database = %kind, "resolved dialect");
            Ok(kind.dialect())
        }
        None => Err(StatsqlError::UnsupportedDialect(scheme_of(url).to_string())),
    }
}

fn scheme_of(url: &str) -> &str {
    url.split_once("://").map(|(scheme, _)| scheme).unwrap_or("<none>")
}

/// Look up an IANA timezone name.
pub(crate) fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| StatsqlError::InvalidTimezone(name.to_string()))
}

mod mysql;
pub use mysql::MySqlDialect;

mod postgres;
pub use postgres::PostgresDialect;
