use crate::params::ParamList;

use super::{build_filter_clause, FilterKey, FilterValue, Filters};

pub const DEFAULT_SESSION_KEY: &str = "session_id";

/// Filters split by the table they apply to, plus the combined clause.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterParts {
    /// `domain`, `url`, `referrer` and `query`.
    pub pageview: Filters,
    /// `os`, `browser`, `device` and `country`.
    pub session: Filters,
    /// `event_url` (as `url`) and `event_name`.
    pub event: Filters,
    pub event_name: Option<FilterValue>,
    /// Join onto `session`, or empty when no session filter is active.
    pub join_session: String,
    /// Clause over every filter, bound into the caller's parameters.
    pub filter_clause: String,
}

impl Filters {
    /// Split the filters into page-view, session and event groups.
    ///
    /// `table` is the outer table the session join hangs off and
    /// `session_key` the column both tables share.
    pub fn partition(
        &self,
        params: &mut ParamList,
        table: &str,
        session_key: &str,
    ) -> FilterParts {
        let pageview = Filters {
            domain: self.domain.clone(),
            url: self.url.clone(),
            referrer: self.referrer.clone(),
            query: self.query.clone(),
            ..Filters::default()
        };
        let session = Filters {
            os: self.os.clone(),
            browser: self.browser.clone(),
            device: self.device.clone(),
            country: self.country.clone(),
            ..Filters::default()
        };
        let event = Filters {
            url: self.event_url.clone(),
            event_name: self.event_name.clone(),
            ..Filters::default()
        };

        let needs_session = [
            FilterKey::Os,
            FilterKey::Browser,
            FilterKey::Device,
            FilterKey::Country,
        ]
        .into_iter()
        .any(|key| self.active(key).is_some());

        let join_session = if needs_session {
            format!("inner join session on {table}.{session_key} = session.{session_key}")
        } else {
            String::new()
        };

        FilterParts {
            pageview,
            session,
            event,
            event_name: self.event_name.clone(),
            join_session,
            filter_clause: build_filter_clause(self, params),
        }
    }
}
