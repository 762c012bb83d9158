//! Event definitions loaded as data.
//!
//! Every event's rules are validated while the catalog is deserialized, so a malformed
//! rule set is rejected at load time and never reaches an evaluation.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::{
    DateRegisteredRule, EditCountRule, HasGroupDurationRule, Mode, NotBlockedRule, NotBotRule,
    Rule, RuleEntry, RuleSet, RuleSetError, Workflow,
};
use crate::sources::{DateWindow, SourceId};

const BUILTIN_EVENTS: &str = include_str!("events.json");

/// Serialized form of one rule and its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleSpec {
    EditCount {
        min_edits: u64,
        #[serde(default)]
        from: Option<NaiveDate>,
        #[serde(default)]
        until: Option<NaiveDate>,
    },
    DateRegistered {
        before: NaiveDate,
    },
    NotBlocked {
        #[serde(default)]
        max_blocked_sources: u32,
    },
    NotBot,
    HasGroupDuration {
        group: String,
        min_months: u32,
        as_of: NaiveDate,
    },
}

impl From<&RuleSpec> for Rule {
    fn from(spec: &RuleSpec) -> Self {
        match spec {
            RuleSpec::EditCount {
                min_edits,
                from,
                until,
            } => EditCountRule::new(*min_edits, DateWindow::new(*from, *until)).into(),
            RuleSpec::DateRegistered { before } => DateRegisteredRule::new(*before).into(),
            RuleSpec::NotBlocked {
                max_blocked_sources,
            } => NotBlockedRule::new(*max_blocked_sources).into(),
            RuleSpec::NotBot => NotBotRule.into(),
            RuleSpec::HasGroupDuration {
                group,
                min_months,
                as_of,
            } => HasGroupDurationRule::new(group.clone(), *min_months, *as_of).into(),
        }
    }
}

/// A rule plus its workflow flags, as written in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySpec {
    #[serde(flatten)]
    pub rule: RuleSpec,
    /// Falls back to the rule's default mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub hard_fail: bool,
    #[serde(default)]
    pub skip_remaining_on_fail: bool,
}

impl EntrySpec {
    pub fn build(&self) -> Result<RuleEntry, RuleSetError> {
        let rule = Rule::from(&self.rule);
        let mut workflow = Workflow::new(self.mode.unwrap_or_else(|| rule.default_mode()));
        workflow.hard_fail_on_fail = self.hard_fail;
        workflow.skip_remaining_on_fail = self.skip_remaining_on_fail;
        RuleEntry::new(rule, workflow)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct EventDefinition {
    id: String,
    year: i32,
    name: String,
    url: String,
    #[serde(default)]
    required_source: Option<SourceId>,
    rules: Vec<EntrySpec>,
    #[serde(default)]
    extra_requirements: Vec<String>,
}

/// A community event and the rules deciding who may take part.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "EventDefinition")]
pub struct Event {
    pub id: String,
    pub year: i32,
    pub name: String,
    pub url: String,
    /// Human-checked requirements the engine cannot evaluate.
    pub extra_requirements: Vec<String>,
    rule_set: RuleSet,
}

impl TryFrom<EventDefinition> for Event {
    type Error = InvalidEvent;

    fn try_from(definition: EventDefinition) -> Result<Self, Self::Error> {
        let invalid = |source| InvalidEvent {
            id: definition.id.clone(),
            source,
        };

        let entries = definition
            .rules
            .iter()
            .map(EntrySpec::build)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;
        let mut rule_set = RuleSet::new(entries).map_err(invalid)?;
        if let Some(source) = definition.required_source {
            rule_set = rule_set.requiring_source(source);
        }

        Ok(Self {
            id: definition.id,
            year: definition.year,
            name: definition.name,
            url: definition.url,
            extra_requirements: definition.extra_requirements,
            rule_set,
        })
    }
}

impl Event {
    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    pub fn summary(&self) -> EventSummary {
        EventSummary {
            id: self.id.clone(),
            year: self.year,
            name: self.name.clone(),
            url: self.url.clone(),
            required_source: self.rule_set.required_source().cloned(),
            requirements: self
                .rule_set
                .entries()
                .iter()
                .map(RuleEntry::describe)
                .collect(),
            extra_requirements: self.extra_requirements.clone(),
        }
    }
}

/// Public listing of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub id: String,
    pub year: i32,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_source: Option<SourceId>,
    pub requirements: Vec<String>,
    pub extra_requirements: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("event {id} has an invalid rule set: {source}")]
pub struct InvalidEvent {
    id: String,
    source: RuleSetError,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("event id {0} is defined more than once")]
    DuplicateEvent(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    events: Vec<Event>,
}

/// Ordered collection of events, most recent first as written in the source file.
#[derive(Debug, Clone)]
pub struct EventCatalog {
    events: Vec<Event>,
}

impl EventCatalog {
    /// Events shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_EVENTS)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        for (index, event) in file.events.iter().enumerate() {
            if file.events[..index].iter().any(|other| other.id == event.id) {
                return Err(CatalogError::DuplicateEvent(event.id.clone()));
            }
        }
        Ok(Self {
            events: file.events,
        })
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn find(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_loads_and_validates() {
        let catalog = EventCatalog::builtin().expect("builtin catalog is valid");
        assert!(!catalog.events().is_empty());

        let event = catalog
            .find("steward-elections-2024")
            .expect("steward elections defined");
        assert_eq!(event.year, 2024);
        assert!(event.rule_set().entries().len() >= 3);
    }

    #[test]
    fn required_source_is_carried_into_rule_set() {
        let catalog = EventCatalog::builtin().expect("builtin catalog is valid");
        let event = catalog.find("enwiki-arbcom-2023").expect("arbcom defined");

        assert_eq!(
            event.rule_set().required_source(),
            Some(&SourceId::new("enwiki"))
        );
        assert_eq!(
            event.summary().required_source,
            Some(SourceId::new("enwiki"))
        );
    }

    #[test]
    fn rejects_contradictory_mode_at_load_time() {
        let raw = r#"{ "events": [{
            "id": "bad", "year": 2020, "name": "Bad", "url": "https://example.org",
            "rules": [{ "rule": "not_blocked", "mode": "on_any_wiki" }]
        }] }"#;

        let err = EventCatalog::from_json(raw).expect_err("mode is rejected");
        assert!(err.to_string().contains("invalid rule set"), "{err}");
    }

    #[test]
    fn rejects_empty_rule_lists_and_duplicates() {
        let empty = r#"{ "events": [{
            "id": "empty", "year": 2020, "name": "Empty", "url": "https://example.org",
            "rules": []
        }] }"#;
        assert!(matches!(
            EventCatalog::from_json(empty),
            Err(CatalogError::Parse(_))
        ));

        let duplicate = r#"{ "events": [
            { "id": "dup", "year": 2020, "name": "A", "url": "u", "rules": [{ "rule": "not_bot" }] },
            { "id": "dup", "year": 2021, "name": "B", "url": "u", "rules": [{ "rule": "not_bot" }] }
        ] }"#;
        assert!(matches!(
            EventCatalog::from_json(duplicate),
            Err(CatalogError::DuplicateEvent(id)) if id == "dup"
        ));
    }

    #[test]
    fn entry_flags_map_onto_workflow() {
        let spec: EntrySpec = serde_json::from_str(
            r#"{ "rule": "edit_count", "min_edits": 600, "until": "2023-11-01",
                 "mode": "accumulate", "hard_fail": true }"#,
        )
        .expect("entry parses");

        let entry = spec.build().expect("entry is valid");
        assert_eq!(entry.workflow().mode, Mode::Accumulate);
        assert!(entry.workflow().hard_fail_on_fail);
        assert!(!entry.workflow().skip_remaining_on_fail);
    }
}
