//! Issue changelog.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};

use super::parse_date_field;
use crate::api::types::{ChangeItemInfo, ChangelogInfo, ChangelogPage, UserInfo};
use crate::error::{Error, Result};

const STATUS_FIELD: &str = "status";
const SECONDS_PER_DAY: f64 = 86400.0;

/// One changed field inside a changelog record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecordItem {
    pub field: String,
    pub fieldtype: String,
    pub from: Option<String>,
    pub from_string: Option<String>,
    pub to: Option<String>,
    pub to_string: Option<String>,
}

impl LogRecordItem {
    /// Check if the human readable value changed.
    pub fn is_string_changed(&self) -> bool {
        self.from_string != self.to_string
    }
}

impl From<ChangeItemInfo> for LogRecordItem {
    fn from(item: ChangeItemInfo) -> Self {
        Self {
            field: item.field,
            fieldtype: item.fieldtype,
            from: item.from,
            from_string: item.from_string,
            to: item.to,
            to_string: item.to_string,
        }
    }
}

/// A set of changes made at once.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangelogRecord {
    pub id: u64,
    pub created: DateTime<Utc>,
    pub author: Option<UserInfo>,
    pub items: Vec<LogRecordItem>,
}

impl ChangelogRecord {
    fn from_info(info: ChangelogInfo) -> Result<Self> {
        let created = parse_date_field("created", Some(info.created.as_str()))?.ok_or_else(|| {
            Error::date(format!("Changelog record {} has no creation time", info.id))
        })?;
        Ok(Self {
            id: info.id,
            created,
            author: info.author,
            items: info.items.into_iter().map(LogRecordItem::from).collect(),
        })
    }
}

/// Issue history, oldest record first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    records: Vec<ChangelogRecord>,
}

impl History {
    pub fn new(mut records: Vec<ChangelogRecord>) -> Self {
        records.sort_by_key(|r| (r.created, r.id));
        Self { records }
    }

    /// Build from the changelog embedded with `expand=changelog`.
    pub fn from_page(page: ChangelogPage) -> Result<Self> {
        let records = page
            .histories
            .into_iter()
            .map(ChangelogRecord::from_info)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[ChangelogRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every change of `field`, oldest first, with the record it belongs to.
    pub fn track_field(&self, field: &str) -> Vec<(&ChangelogRecord, &LogRecordItem)> {
        self.records
            .iter()
            .flat_map(|record| {
                record
                    .items
                    .iter()
                    .filter(move |item| item.field == field)
                    .map(move |item| (record, item))
            })
            .collect()
    }

    /// Time since the last status change, or since `created` when the status
    /// never changed.
    pub fn time_in_last_status(&self, created: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        let since = self
            .track_field(STATUS_FIELD)
            .last()
            .map(|(record, _)| record.created)
            .unwrap_or(created);
        now - since
    }

    /// Working days (Monday to Friday) spent in `status`.
    ///
    /// `current_status` is the status the issue has now; it is used when the
    /// history holds no status change.
    pub fn workdays_in_status(
        &self,
        status: &str,
        created: DateTime<Utc>,
        current_status: &str,
        now: DateTime<Utc>,
    ) -> f64 {
        let changes = self.track_field(STATUS_FIELD);

        let mut intervals = Vec::new();
        let mut state = changes
            .first()
            .and_then(|(_, item)| item.from_string.as_deref())
            .unwrap_or(current_status);
        let mut since = created;

        for (record, item) in &changes {
            intervals.push((state, since, record.created));
            state = item.to_string.as_deref().unwrap_or_default();
            since = record.created;
        }
        intervals.push((state, since, now));

        let seconds: i64 = intervals
            .into_iter()
            .filter(|(name, _, _)| *name == status)
            .map(|(_, start, end)| weekday_seconds(start, end))
            .sum();
        seconds as f64 / SECONDS_PER_DAY
    }
}

/// Seconds between `start` and `end` that fall on weekdays.
fn weekday_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let mut total = 0;
    let mut cursor = start;

    while cursor < end {
        let Some(next_midnight) = cursor
            .date_naive()
            .succ_opt()
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
        else {
            break;
        };
        let segment_end = next_midnight.min(end);
        if !matches!(cursor.weekday(), Weekday::Sat | Weekday::Sun) {
            total += (segment_end - cursor).num_seconds();
        }
        cursor = segment_end;
    }
    total
}
