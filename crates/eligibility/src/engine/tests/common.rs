use chrono::NaiveDate;

use crate::engine::{AccumulateError, ResultInfo, RuleManager, SourceContext};
use crate::sources::{
    AccountStore, BlockStatus, DataSource, DateWindow, FixtureAccount, FixtureStore, LocalRecord,
    RoleLogEvent, SourceId, SourcePresence, StoreError, Subject,
};

pub(super) const USERNAME: &str = "Example";

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn subject() -> Subject {
    Subject::new(USERNAME).expect("valid subject")
}

pub(super) fn wiki(id: &str) -> DataSource {
    DataSource::new(id, format!("{id}.example.org"))
}

/// Account registered well before every window used in these tests.
pub(super) fn account(source: &str, user_id: u64) -> FixtureAccount {
    FixtureAccount::new(USERNAME, source, user_id).registered(date(2010, 1, 1))
}

/// Store holding `accounts`, with one open source per distinct account source.
pub(super) fn store_with(accounts: Vec<FixtureAccount>) -> FixtureStore {
    let mut store = FixtureStore::default();
    let mut seen: Vec<SourceId> = Vec::new();
    for account in &accounts {
        if !seen.contains(&account.source) {
            seen.push(account.source.clone());
            store = store.with_source(wiki(account.source.as_str()));
        }
    }
    accounts
        .into_iter()
        .fold(store, |store, account| store.with_account(account))
}

/// Run one `accumulate` call for the subject's account on `source_id`.
pub(super) fn feed(
    manager: &mut RuleManager,
    store: &dyn AccountStore,
    source_id: &str,
) -> Result<Vec<ResultInfo>, AccumulateError> {
    let subject = subject();
    let presence = store
        .presence_sources(&subject)
        .expect("presence lookup")
        .into_iter()
        .find(|presence| presence.source.id.as_str() == source_id)
        .expect("subject has an account on source");
    let record = store
        .local_record(&presence.source, &subject)
        .expect("record lookup")
        .expect("record present");

    let context = SourceContext {
        store,
        subject: &subject,
        source: &presence.source,
        record: &record,
    };
    manager.accumulate(&context)
}

/// Fails block lookups on one source and delegates everything else.
pub(super) struct FlakyBlocks {
    pub(super) inner: FixtureStore,
    pub(super) failing: SourceId,
}

impl AccountStore for FlakyBlocks {
    fn presence_sources(&self, subject: &Subject) -> Result<Vec<SourcePresence>, StoreError> {
        self.inner.presence_sources(subject)
    }

    fn local_record(
        &self,
        source: &DataSource,
        subject: &Subject,
    ) -> Result<Option<LocalRecord>, StoreError> {
        self.inner.local_record(source, subject)
    }

    fn edit_count(
        &self,
        source: &DataSource,
        user_id: u64,
        window: &DateWindow,
    ) -> Result<u64, StoreError> {
        self.inner.edit_count(source, user_id, window)
    }

    fn block_status(&self, source: &DataSource, user_id: u64) -> Result<BlockStatus, StoreError> {
        if source.id == self.failing {
            return Err(StoreError::Query("block lookup timed out".to_string()));
        }
        self.inner.block_status(source, user_id)
    }

    fn groups(&self, source: &DataSource, user_id: u64) -> Result<Vec<String>, StoreError> {
        self.inner.groups(source, user_id)
    }

    fn role_log(
        &self,
        source: &DataSource,
        user_id: u64,
        group: &str,
    ) -> Result<Vec<RoleLogEvent>, StoreError> {
        self.inner.role_log(source, user_id, group)
    }

    fn mirror_role_log(
        &self,
        source: &DataSource,
        subject: &Subject,
        group: &str,
    ) -> Result<Vec<RoleLogEvent>, StoreError> {
        self.inner.mirror_role_log(source, subject, group)
    }
}

/// Store whose presence lookup is down.
pub(super) struct PresenceDown;

impl AccountStore for PresenceDown {
    fn presence_sources(&self, _subject: &Subject) -> Result<Vec<SourcePresence>, StoreError> {
        Err(StoreError::Query("central account table unavailable".to_string()))
    }

    fn local_record(
        &self,
        _source: &DataSource,
        _subject: &Subject,
    ) -> Result<Option<LocalRecord>, StoreError> {
        Ok(None)
    }

    fn edit_count(
        &self,
        _source: &DataSource,
        _user_id: u64,
        _window: &DateWindow,
    ) -> Result<u64, StoreError> {
        Ok(0)
    }

    fn block_status(
        &self,
        _source: &DataSource,
        _user_id: u64,
    ) -> Result<BlockStatus, StoreError> {
        Ok(BlockStatus::default())
    }

    fn groups(&self, _source: &DataSource, _user_id: u64) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }

    fn role_log(
        &self,
        _source: &DataSource,
        _user_id: u64,
        _group: &str,
    ) -> Result<Vec<RoleLogEvent>, StoreError> {
        Ok(Vec::new())
    }

    fn mirror_role_log(
        &self,
        _source: &DataSource,
        _subject: &Subject,
        _group: &str,
    ) -> Result<Vec<RoleLogEvent>, StoreError> {
        Ok(Vec::new())
    }
}
