use super::entry::RuleEntry;
use super::error::RuleSetError;
use super::manager::RuleManager;
use crate::sources::SourceId;

/// Validated, never-evaluated rule entries for one event. Each evaluation gets a fresh
/// manager built from this template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    entries: Vec<RuleEntry>,
    required_source: Option<SourceId>,
}

impl RuleSet {
    pub fn new(entries: Vec<RuleEntry>) -> Result<Self, RuleSetError> {
        if entries.is_empty() {
            return Err(RuleSetError::Empty);
        }
        Ok(Self {
            entries,
            required_source: None,
        })
    }

    /// Restrict evaluation to a single source unless the caller pins another one.
    pub fn requiring_source(mut self, source: SourceId) -> Self {
        self.required_source = Some(source);
        self
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn required_source(&self) -> Option<&SourceId> {
        self.required_source.as_ref()
    }

    pub fn manager(&self) -> RuleManager {
        RuleManager::from_entries(self.entries.clone())
    }
}
