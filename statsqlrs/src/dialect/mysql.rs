//! MySQL dialect implementation.

use chrono::{DateTime, Offset, Utc};
use chrono_tz::Tz;

use crate::error::Result;

use super::{parse_timezone, DatabaseKind, Dialect, ParamType, TimeUnit};

#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::MySql
    }

    fn placeholder(&self, _idx: usize) -> String {
        "?".to_string()
    }

    fn date_format(&self, unit: TimeUnit) -> &'static str {
        match unit {
            TimeUnit::Minute => "%Y-%m-%d %H:%i:00",
            TimeUnit::Hour => "%Y-%m-%d %H:00:00",
            TimeUnit::Day => "%Y-%m-%d",
            TimeUnit::Month => "%Y-%m-01",
            TimeUnit::Year => "%Y-01-01",
        }
    }

    fn date_trunc(&self, field: &str, unit: TimeUnit, timezone: Option<&str>) -> Result<String> {
        let pattern = self.date_format(unit);
        match timezone {
            Some(tz) => {
                // The offset is fixed at render time, so rows on the other side
                // of a DST transition are shifted by the current offset.
                let offset = utc_offset_at(parse_timezone(tz)?, Utc::now());
                Ok(format!(
                    "date_format(convert_tz({field},'+00:00','{offset}'), '{pattern}')"
                ))
            }
            None => Ok(format!("date_format({field}, '{pattern}')")),
        }
    }

    fn seconds_between(&self, field: &str) -> String {
        format!("floor(unix_timestamp(max({field})) - unix_timestamp(min({field})))")
    }

    // MySQL coerces the extracted text on comparison, so no cast is emitted
    // even when `as_number` is set.
    fn json_field(&self, column: &str, property: &str, _as_number: bool) -> String {
        format!("{column} ->> \"$.{property}\"")
    }

    // MySQL coerces text parameters to the compared column type.
    fn param_cast(&self, _ty: ParamType) -> &'static str {
        ""
    }
}

/// `+HH:MM` offset of `tz` from UTC at the instant `at`.
pub(crate) fn utc_offset_at(tz: Tz, at: DateTime<Utc>) -> String {
    let seconds = at.with_timezone(&tz).offset().fix().local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn truncates_without_timezone() {
        let sql = MySqlDialect
            .date_trunc("created_at", TimeUnit::Month, None)
            .unwrap();
        assert_eq!(sql, "date_format(created_at, '%Y-%m-01')");
    }

    #[test]
    fn truncates_in_utc() {
        let sql = MySqlDialect
            .date_trunc("created_at", TimeUnit::Minute, Some("UTC"))
            .unwrap();
        assert_eq!(
            sql,
            "date_format(convert_tz(created_at,'+00:00','+00:00'), '%Y-%m-%d %H:%i:00')"
        );
    }

    #[test]
    fn every_unit_uses_date_format() {
        for unit in TimeUnit::ALL {
            let sql = MySqlDialect
                .date_trunc("t", unit, Some("Asia/Tokyo"))
                .unwrap();
            assert!(sql.contains("date_format"));
        }
    }

    #[test]
    fn offset_follows_daylight_saving() {
        let winter = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        let ny: Tz = "America/New_York".parse().unwrap();
        assert_eq!(utc_offset_at(ny, winter), "-05:00");
        assert_eq!(utc_offset_at(ny, summer), "-04:00");

        let kolkata: Tz = "Asia/Kolkata".parse().unwrap();
        assert_eq!(utc_offset_at(kolkata, winter), "+05:30");
    }

    #[test]
    fn json_field_never_casts() {
        for as_number in [false, true] {
            let sql = MySqlDialect.json_field("event_data", "amount", as_number);
            assert_eq!(sql, "event_data ->> \"$.amount\"");
            assert!(!sql.contains("CAST"));
        }
    }

    #[test]
    fn seconds_between_uses_unix_timestamp() {
        assert_eq!(
            MySqlDialect.seconds_between("created_at"),
            "floor(unix_timestamp(max(created_at)) - unix_timestamp(min(created_at)))"
        );
    }

    #[test]
    fn parameters_need_no_cast() {
        assert_eq!(MySqlDialect.uuid_cast(), "");
        assert_eq!(MySqlDialect.param_cast(ParamType::Timestamp), "");
    }

    #[test]
    fn rewrites_placeholders_in_order() {
        assert_eq!(
            MySqlDialect.rewrite_placeholders("a=$1 and b=$2"),
            "a=? and b=?"
        );
        assert_eq!(
            MySqlDialect.rewrite_placeholders("select 1"),
            "select 1"
        );
    }
}
