use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use crate::params::ParamList;

use super::{FilterKey, Filters};

/// Render the active filters as `and ...` fragments, one per line.
///
/// Values are bound through `params` in emission order; the clause is meant to
/// follow an existing `WHERE` condition. Absent and ignored filters emit
/// nothing and bind nothing.
pub fn build_filter_clause(filters: &Filters, params: &mut ParamList) -> String {
    let mut fragments = Vec::new();

    for key in FilterKey::ALL {
        let Some(raw) = filters.active(key) else {
            continue;
        };
        match key {
            FilterKey::Url
            | FilterKey::Os
            | FilterKey::Browser
            | FilterKey::Device
            | FilterKey::Country
            | FilterKey::EventName => {
                let placeholder = params.push(decode(raw));
                fragments.push(format!("and {key}={placeholder}"));
            }
            FilterKey::Referrer => {
                let placeholder = params.push(format!("%{}%", decode(raw)));
                fragments.push(format!("and referrer like {placeholder}"));
            }
            FilterKey::Domain => {
                let placeholder = params.push(format!("%://{raw}/%"));
                fragments.push(format!("and referrer not like {placeholder}"));
                fragments.push("and referrer not like '/%'".to_string());
            }
            FilterKey::Query => fragments.push("and url like '%?%'".to_string()),
            // Only consumed through the event group of a partition.
            FilterKey::EventUrl => {}
        }
    }

    tracing::debug!(
        fragments = fragments.len(),
        params = params.len(),
        "built filter clause"
    );
    fragments.join("\n")
}

fn decode(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}
