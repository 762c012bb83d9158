use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    AccountStore, BlockStatus, DataSource, DateWindow, LocalRecord, Registration, RoleLogEvent,
    SourceId, SourcePresence, StoreError, Subject,
};

/// `AccountStore` backed by a JSON snapshot of per-source account facts.
///
/// Used by the CLI and the HTTP server when no live database is wired in, and by the
/// test suites. Sources listed in `unreachable` fail every query, which is how fetch
/// failures are simulated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureStore {
    #[serde(default)]
    sources: Vec<DataSource>,
    #[serde(default)]
    accounts: Vec<FixtureAccount>,
    #[serde(default)]
    mirror_log: Vec<MirrorLogEntry>,
    #[serde(default)]
    unreachable: BTreeSet<SourceId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureAccount {
    pub username: String,
    pub source: SourceId,
    pub user_id: u64,
    /// `None` when the account predates registration logging.
    #[serde(default)]
    pub registration: Option<NaiveDate>,
    #[serde(default)]
    pub edits: Vec<EditDay>,
    #[serde(default)]
    pub block: BlockStatus,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub role_log: Vec<RoleLogEntry>,
}

impl FixtureAccount {
    pub fn new(username: &str, source: &str, user_id: u64) -> Self {
        Self {
            username: username.to_string(),
            source: SourceId::new(source),
            user_id,
            registration: None,
            edits: Vec::new(),
            block: BlockStatus::default(),
            groups: Vec::new(),
            role_log: Vec::new(),
        }
    }

    pub fn registered(mut self, date: NaiveDate) -> Self {
        self.registration = Some(date);
        self
    }

    pub fn with_edits(mut self, date: NaiveDate, count: u64) -> Self {
        self.edits.push(EditDay { date, count });
        self
    }

    pub fn blocked(mut self, indefinite: bool) -> Self {
        self.block = BlockStatus {
            blocked: true,
            indefinite,
        };
        self
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.groups.push(group.to_string());
        self
    }

    pub fn with_role_change(mut self, group: &str, date: NaiveDate, held: bool) -> Self {
        self.role_log.push(RoleLogEntry {
            group: group.to_string(),
            date,
            held,
        });
        self
    }

    fn total_edits(&self) -> u64 {
        self.edits.iter().map(|day| day.count).sum()
    }

    fn matches(&self, subject: &Subject) -> bool {
        Subject::new(&self.username).is_ok_and(|name| &name == subject)
    }
}

/// Edits made on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDay {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleLogEntry {
    pub group: String,
    pub date: NaiveDate,
    pub held: bool,
}

/// Cross-source log entry: a change to `username`'s group on `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorLogEntry {
    pub username: String,
    pub source: SourceId,
    pub group: String,
    pub date: NaiveDate,
    pub held: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("unable to read fixture: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed fixture: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("account {username} references unknown source {source_id}")]
    UnknownSource { username: String, source_id: SourceId },
}

impl FixtureStore {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FixtureError> {
        let store: Self = serde_json::from_reader(reader)?;
        store.validate()?;
        Ok(store)
    }

    pub fn with_source(mut self, source: DataSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_account(mut self, account: FixtureAccount) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn with_mirror_entry(mut self, entry: MirrorLogEntry) -> Self {
        self.mirror_log.push(entry);
        self
    }

    pub fn unreachable(mut self, source: &str) -> Self {
        self.unreachable.insert(SourceId::new(source));
        self
    }

    pub fn sources(&self) -> &[DataSource] {
        &self.sources
    }

    fn validate(&self) -> Result<(), FixtureError> {
        for account in &self.accounts {
            if !self.sources.iter().any(|source| source.id == account.source) {
                return Err(FixtureError::UnknownSource {
                    username: account.username.clone(),
                    source_id: account.source.clone(),
                });
            }
        }
        Ok(())
    }

    fn reachable(&self, source: &DataSource) -> Result<(), StoreError> {
        if self.unreachable.contains(&source.id) {
            return Err(StoreError::Unavailable {
                source_id: source.id.clone(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn account(&self, source: &DataSource, user_id: u64) -> Result<&FixtureAccount, StoreError> {
        self.reachable(source)?;
        self.accounts
            .iter()
            .find(|account| account.source == source.id && account.user_id == user_id)
            .ok_or_else(|| StoreError::Query(format!("no user #{user_id} on {}", source.id)))
    }
}

impl AccountStore for FixtureStore {
    fn presence_sources(&self, subject: &Subject) -> Result<Vec<SourcePresence>, StoreError> {
        let presences = self
            .accounts
            .iter()
            .filter(|account| account.matches(subject))
            .filter_map(|account| {
                self.sources
                    .iter()
                    .find(|source| source.id == account.source)
                    .map(|source| SourcePresence {
                        source: source.clone(),
                        edit_count: account.total_edits(),
                    })
            })
            .collect();
        Ok(presences)
    }

    fn local_record(
        &self,
        source: &DataSource,
        subject: &Subject,
    ) -> Result<Option<LocalRecord>, StoreError> {
        self.reachable(source)?;
        let record = self
            .accounts
            .iter()
            .find(|account| account.source == source.id && account.matches(subject))
            .map(|account| LocalRecord {
                source: source.id.clone(),
                user_id: account.user_id,
                registration: account
                    .registration
                    .map_or(Registration::Unknown, Registration::On),
                edit_count: account.total_edits(),
            });
        Ok(record)
    }

    fn edit_count(
        &self,
        source: &DataSource,
        user_id: u64,
        window: &DateWindow,
    ) -> Result<u64, StoreError> {
        let account = self.account(source, user_id)?;
        Ok(account
            .edits
            .iter()
            .filter(|day| window.contains(day.date))
            .map(|day| day.count)
            .sum())
    }

    fn block_status(&self, source: &DataSource, user_id: u64) -> Result<BlockStatus, StoreError> {
        Ok(self.account(source, user_id)?.block)
    }

    fn groups(&self, source: &DataSource, user_id: u64) -> Result<Vec<String>, StoreError> {
        Ok(self.account(source, user_id)?.groups.clone())
    }

    fn role_log(
        &self,
        source: &DataSource,
        user_id: u64,
        group: &str,
    ) -> Result<Vec<RoleLogEvent>, StoreError> {
        let account = self.account(source, user_id)?;
        Ok(account
            .role_log
            .iter()
            .filter(|entry| entry.group == group)
            .map(|entry| RoleLogEvent {
                date: entry.date,
                held: entry.held,
            })
            .collect())
    }

    fn mirror_role_log(
        &self,
        source: &DataSource,
        subject: &Subject,
        group: &str,
    ) -> Result<Vec<RoleLogEvent>, StoreError> {
        self.reachable(source)?;
        Ok(self
            .mirror_log
            .iter()
            .filter(|entry| entry.source == source.id && entry.group == group)
            .filter(|entry| Subject::new(&entry.username).is_ok_and(|name| &name == subject))
            .map(|entry| RoleLogEvent {
                date: entry.date,
                held: entry.held,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn loads_snapshot_and_answers_windowed_counts() {
        let json = r#"{
            "sources": [{ "id": "enwiki", "domain": "en.wikipedia.org" }],
            "accounts": [{
                "username": "Example",
                "source": "enwiki",
                "user_id": 7,
                "registration": "2009-04-01",
                "edits": [
                    { "date": "2010-01-01", "count": 30 },
                    { "date": "2012-06-01", "count": 12 }
                ]
            }]
        }"#;
        let store = FixtureStore::from_reader(json.as_bytes()).expect("fixture parses");
        let subject = Subject::new("example").expect("valid subject");
        let source = &store.sources()[0];

        let record = store
            .local_record(source, &subject)
            .expect("reachable")
            .expect("account present");
        assert_eq!(record.registration, Registration::On(date(2009, 4, 1)));
        assert_eq!(record.edit_count, 42);

        let window = DateWindow::new(Some(date(2011, 1, 1)), None);
        assert_eq!(store.edit_count(source, 7, &window).expect("count"), 12);
    }

    #[test]
    fn rejects_accounts_on_unknown_sources() {
        let json = r#"{ "accounts": [{ "username": "X", "source": "nowiki", "user_id": 1 }] }"#;
        match FixtureStore::from_reader(json.as_bytes()) {
            Err(FixtureError::UnknownSource { source_id, .. }) => {
                assert_eq!(source_id, SourceId::new("nowiki"))
            }
            other => panic!("expected unknown source error, got {other:?}"),
        }
    }

    #[test]
    fn unreachable_sources_fail_queries() {
        let source = DataSource::new("dewiki", "de.wikipedia.org");
        let store = FixtureStore::default()
            .with_source(source.clone())
            .with_account(FixtureAccount::new("Example", "dewiki", 3))
            .unreachable("dewiki");
        let subject = Subject::new("Example").expect("valid subject");

        assert!(matches!(
            store.local_record(&source, &subject),
            Err(StoreError::Unavailable { .. })
        ));
    }
}
