//! Domain wrappers over JIRA resources.
//!
//! A wrapper is created from an id or key without any I/O. The JSON object
//! behind it is fetched on first use and kept until [`Issue::drop_cache`] (or
//! the wrapper's equivalent) is called. Setters only record pending edits;
//! `save()` pushes them to JIRA in one request.

mod attachments;
mod comment;
mod component;
pub mod custom_fields;
mod dictionary;
mod group;
mod history;
mod issue;
mod link;
mod user;
mod version;
mod watchers;

pub use attachments::{Attachments, File};
pub use comment::Comment;
pub use component::{AssigneeType, Component};
pub use dictionary::{IssueType, Priority, Resolution, Security, Status, StatusCategory};
pub use group::Group;
pub use history::{ChangelogRecord, History, LogRecordItem};
pub use issue::Issue;
pub use link::{Link, LinkType, LinksList};
pub use user::{User, UsersList, AVATAR_L, AVATAR_M, AVATAR_S, AVATAR_XS};
pub use version::Version;
pub use watchers::WatchersList;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{Error, Result};

/// Parse a JIRA date or date-time value.
///
/// Accepts `2024-01-02T10:00:00.000+0000`, RFC 3339 and plain `2024-01-02`
/// (midnight UTC).
pub fn parse_jira_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Parse an optional date value of field `field_id`.
///
/// Empty values give `None`; unparsable ones are an error.
pub(crate) fn parse_date_field(field_id: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match value {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => parse_jira_datetime(s).map(Some).ok_or_else(|| {
            Error::date(format!(
                "Can't parse '{}' field value as time string: '{}'",
                field_id, s
            ))
        }),
    }
}

/// Format a date the way JIRA expects it in `YYYY-MM-DD` fields.
pub(crate) fn format_jira_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_jira_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        assert_eq!(parse_jira_datetime("2024-01-02T10:00:00.000+0000"), Some(expected));
        assert_eq!(parse_jira_datetime("2024-01-02T12:00:00.000+0200"), Some(expected));
        assert_eq!(parse_jira_datetime("2024-01-02T10:00:00Z"), Some(expected));
        assert_eq!(
            parse_jira_datetime("2024-01-02"),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_jira_datetime("yesterday"), None);
    }

    #[test]
    fn test_parse_date_field() {
        assert!(parse_date_field("duedate", None).unwrap().is_none());
        assert!(parse_date_field("duedate", Some("")).unwrap().is_none());
        assert!(parse_date_field("duedate", Some("2024-03-01")).unwrap().is_some());

        let err = parse_date_field("duedate", Some("soon")).unwrap_err();
        assert!(matches!(err, Error::Date(_)));
        assert!(err.to_string().contains("'duedate'"));
    }

    #[test]
    fn test_format_jira_date() {
        let date = parse_jira_datetime("2024-03-01T23:00:00.000+0000").unwrap();
        assert_eq!(format_jira_date(date), "2024-03-01");
    }
}
