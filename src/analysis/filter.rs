use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

use crate::types::CommitRecord;

/// Author and date-range restriction applied by a commit source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitFilter {
    /// Case-insensitive substring matched against author name or email
    pub author: Option<String>,
    /// First day included
    pub since: Option<NaiveDate>,
    /// Last day included
    pub until: Option<NaiveDate>,
}

impl CommitFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_since(mut self, since: NaiveDate) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: NaiveDate) -> Self {
        self.until = Some(until);
        self
    }

    /// Resolve the filter against the local time zone.
    pub fn resolve(&self) -> ResolvedFilter {
        self.resolve_in(&Local)
    }

    pub fn resolve_in<Tz: TimeZone>(&self, tz: &Tz) -> ResolvedFilter {
        let (start, end) = normalize_date_range(self.since, self.until, tz);
        ResolvedFilter {
            author: self
                .author
                .as_deref()
                .map(str::trim)
                .filter(|author| !author.is_empty())
                .map(str::to_lowercase),
            start,
            end,
        }
    }
}

/// A [`CommitFilter`] with its day bounds turned into instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilter {
    author: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl ResolvedFilter {
    pub fn matches_author(&self, name: &str, email: &str) -> bool {
        match &self.author {
            Some(needle) => {
                name.to_lowercase().contains(needle.as_str())
                    || email.to_lowercase().contains(needle.as_str())
            }
            None => true,
        }
    }

    pub fn matches_time(&self, timestamp: &DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if timestamp < &start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if timestamp > &end {
                return false;
            }
        }
        true
    }

    pub fn matches(&self, commit: &CommitRecord) -> bool {
        self.matches_author(&commit.author_name, &commit.author_email)
            && self.matches_time(&commit.timestamp)
    }
}

/// Widen a day range to whole days: the start at 00:00:00.000 and the end at
/// 23:59:59.999 in `tz`.
pub fn normalize_date_range<Tz: TimeZone>(
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
    tz: &Tz,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let start = since
        .and_then(|day| day.and_hms_milli_opt(0, 0, 0, 0))
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc));
    let end = until
        .and_then(|day| day.and_hms_milli_opt(23, 59, 59, 999))
        .and_then(|naive| tz.from_local_datetime(&naive).latest())
        .map(|dt| dt.with_timezone(&Utc));
    (start, end)
}
