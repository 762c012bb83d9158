//! Data sources ("wikis") and the capability trait the engine queries them through.

mod fixture;
mod subject;

pub use fixture::{
    EditDay, FixtureAccount, FixtureError, FixtureStore, MirrorLogEntry, RoleLogEntry,
};
pub use subject::{Subject, SubjectError};

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Earliest date local logs reliably cover. Accounts registered before this may have
/// history that no log records.
pub const LOGGING_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2005, 12, 22) {
    Some(date) => date,
    None => panic!("invalid logging epoch"),
};

/// Stable identifier of a data source, e.g. `enwiki`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An addressable, independently queryable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: SourceId,
    pub domain: String,
    /// Closed or private sources are never evaluated.
    #[serde(default)]
    pub closed: bool,
}

impl DataSource {
    pub fn new(id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: SourceId::new(id),
            domain: domain.into(),
            closed: false,
        }
    }

    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }
}

/// A source where an account by the subject's name exists, with a cheap evidence proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcePresence {
    pub source: DataSource,
    pub edit_count: u64,
}

/// When the local account was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Registration {
    On(NaiveDate),
    /// The account predates registration logging.
    Unknown,
}

impl Registration {
    pub fn date(self) -> Option<NaiveDate> {
        match self {
            Registration::On(date) => Some(date),
            Registration::Unknown => None,
        }
    }

    /// Whether the account may have history older than the local logs.
    pub fn predates_logging(self) -> bool {
        match self {
            Registration::On(date) => date < LOGGING_EPOCH,
            Registration::Unknown => true,
        }
    }
}

/// Per-(subject, source) facts loaded once per visited source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalRecord {
    pub source: SourceId,
    pub user_id: u64,
    pub registration: Registration,
    pub edit_count: u64,
}

/// Half-open date window `[from, until)`; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub until: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(from: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        Self { from, until }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.until.map_or(true, |until| date < until)
    }

    pub fn describe(&self) -> String {
        match (self.from, self.until) {
            (Some(from), Some(until)) => format!("between {from} and {until}"),
            (Some(from), None) => format!("since {from}"),
            (None, Some(until)) => format!("before {until}"),
            (None, None) => "overall".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStatus {
    pub blocked: bool,
    #[serde(default)]
    pub indefinite: bool,
}

/// One grant (`held == true`) or removal of a group, in log order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleLogEvent {
    pub date: NaiveDate,
    pub held: bool,
}

/// Everything the rules need to know about a subject, per source.
///
/// Implementations back onto whatever database layer hosts the sources; the engine only
/// relies on this contract.
pub trait AccountStore: Send + Sync {
    fn presence_sources(&self, subject: &Subject) -> Result<Vec<SourcePresence>, StoreError>;
    fn local_record(
        &self,
        source: &DataSource,
        subject: &Subject,
    ) -> Result<Option<LocalRecord>, StoreError>;
    fn edit_count(
        &self,
        source: &DataSource,
        user_id: u64,
        window: &DateWindow,
    ) -> Result<u64, StoreError>;
    fn block_status(&self, source: &DataSource, user_id: u64) -> Result<BlockStatus, StoreError>;
    fn groups(&self, source: &DataSource, user_id: u64) -> Result<Vec<String>, StoreError>;
    fn role_log(
        &self,
        source: &DataSource,
        user_id: u64,
        group: &str,
    ) -> Result<Vec<RoleLogEvent>, StoreError>;
    /// Changes to the subject's local groups recorded on the canonical cross-source log.
    fn mirror_role_log(
        &self,
        source: &DataSource,
        subject: &Subject,
        group: &str,
    ) -> Result<Vec<RoleLogEvent>, StoreError>;
}

/// Fetch failure reaching a data source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("source {source_id} unavailable: {reason}")]
    Unavailable { source_id: SourceId, reason: String },
    #[error("query failed: {0}")]
    Query(String),
}
