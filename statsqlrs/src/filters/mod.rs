//! Typed request filters and the `WHERE`-clause fragments built from them.
//!
//! Filters arrive as a loose key/value object. [`Filters::from_json`] narrows
//! that to the closed set of [`FilterKey`]s; everything downstream works on
//! the typed record.

use std::fmt;

use serde_json::{Map, Value};

mod clause;
mod partition;

pub use clause::build_filter_clause;
pub use partition::{FilterParts, DEFAULT_SESSION_KEY};

/// Filter keys the clause builders understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Url,
    Os,
    Browser,
    Device,
    Country,
    EventName,
    Referrer,
    Domain,
    Query,
    EventUrl,
}

impl FilterKey {
    /// Every key, in the order clauses are emitted.
    pub const ALL: [FilterKey; 10] = [
        FilterKey::Url,
        FilterKey::Os,
        FilterKey::Browser,
        FilterKey::Device,
        FilterKey::Country,
        FilterKey::EventName,
        FilterKey::Referrer,
        FilterKey::Domain,
        FilterKey::Query,
        FilterKey::EventUrl,
    ];

    /// Wire name of the key, which doubles as its column name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::Url => "url",
            FilterKey::Os => "os",
            FilterKey::Browser => "browser",
            FilterKey::Device => "device",
            FilterKey::Country => "country",
            FilterKey::EventName => "event_name",
            FilterKey::Referrer => "referrer",
            FilterKey::Domain => "domain",
            FilterKey::Query => "query",
            FilterKey::EventUrl => "event_url",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        FilterKey::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value bound to a filter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Value(String),
    /// The filter is explicitly switched off; builders treat it as absent.
    Ignored,
}

impl FilterValue {
    pub fn as_active(&self) -> Option<&str> {
        match self {
            FilterValue::Value(v) => Some(v.as_str()),
            FilterValue::Ignored => None,
        }
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Value(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Value(value.to_string())
    }
}

/// Closed record of every recognized filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub url: Option<FilterValue>,
    pub os: Option<FilterValue>,
    pub browser: Option<FilterValue>,
    pub device: Option<FilterValue>,
    pub country: Option<FilterValue>,
    pub event_name: Option<FilterValue>,
    pub referrer: Option<FilterValue>,
    pub domain: Option<FilterValue>,
    pub query: Option<FilterValue>,
    pub event_url: Option<FilterValue>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the record from a loose JSON object.
    ///
    /// Unknown keys and `null` values are skipped. Numbers and booleans are
    /// kept as their text form.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        let mut filters = Filters::new();
        for (name, value) in map {
            let Some(key) = FilterKey::from_name(name) else {
                tracing::debug!(key = %name, "ignoring unrecognized filter key");
                continue;
            };
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    tracing::debug!(key = %name, "ignoring non-scalar filter value");
                    continue;
                }
            };
            filters.set(key, text);
        }
        filters
    }

    /// Build the record from name/value pairs, skipping unrecognized names.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut filters = Filters::new();
        for (name, value) in pairs {
            match FilterKey::from_name(name.as_ref()) {
                Some(key) => filters.set(key, FilterValue::Value(value.into())),
                None => tracing::debug!(key = %name.as_ref(), "ignoring unrecognized filter key"),
            }
        }
        filters
    }

    pub fn get(&self, key: FilterKey) -> Option<&FilterValue> {
        self.slot(key).as_ref()
    }

    /// The value to filter on, or `None` when the key is absent or ignored.
    pub fn active(&self, key: FilterKey) -> Option<&str> {
        self.get(key).and_then(FilterValue::as_active)
    }

    pub fn set(&mut self, key: FilterKey, value: impl Into<FilterValue>) {
        *self.slot_mut(key) = Some(value.into());
    }

    pub fn ignore(&mut self, key: FilterKey) {
        *self.slot_mut(key) = Some(FilterValue::Ignored);
    }

    pub fn with(mut self, key: FilterKey, value: impl Into<FilterValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        FilterKey::ALL.iter().all(|key| self.get(*key).is_none())
    }

    fn slot(&self, key: FilterKey) -> &Option<FilterValue> {
        match key {
            FilterKey::Url => &self.url,
            FilterKey::Os => &self.os,
            FilterKey::Browser => &self.browser,
            FilterKey::Device => &self.device,
            FilterKey::Country => &self.country,
            FilterKey::EventName => &self.event_name,
            FilterKey::Referrer => &self.referrer,
            FilterKey::Domain => &self.domain,
            FilterKey::Query => &self.query,
            FilterKey::EventUrl => &self.event_url,
        }
    }

    fn slot_mut(&mut self, key: FilterKey) -> &mut Option<FilterValue> {
        match key {
            FilterKey::Url => &mut self.url,
            FilterKey::Os => &mut self.os,
            FilterKey::Browser => &mut self.browser,
            FilterKey::Device => &mut self.device,
            FilterKey::Country => &mut self.country,
            FilterKey::EventName => &mut self.event_name,
            FilterKey::Referrer => &mut self.referrer,
            FilterKey::Domain => &mut self.domain,
            FilterKey::Query => &mut self.query,
            FilterKey::EventUrl => &mut self.event_url,
        }
    }
}
