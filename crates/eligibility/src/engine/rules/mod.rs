//! Rule variants and the evaluation contract they share.
//!
//! Rules are stateless. Anything a rule needs to remember between sources (edit totals,
//! blocked-source counts) is handed in as the owning entry's prior [`Tally`] and handed
//! back in the [`Assessment`]; the entry decides whether to commit it.

mod blocks;
mod bot;
mod edit_count;
mod group_duration;
mod registration;

pub use blocks::NotBlockedRule;
pub use bot::NotBotRule;
pub use edit_count::EditCountRule;
pub use group_duration::HasGroupDurationRule;
pub use registration::DateRegisteredRule;

use serde::{Deserialize, Serialize};

use super::error::RuleSetError;
use super::result::ResultInfo;
use crate::sources::{AccountStore, DataSource, LocalRecord, StoreError, Subject};

/// How an entry combines evidence across sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Numeric evidence is summed over every visited source.
    Accumulate,
    /// The rule must pass on a single source by itself.
    OnAnyWiki,
}

/// Running evidence owned by one rule entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub edits: u64,
    pub blocked_sources: u32,
}

/// One rule's result on one source together with the tally to carry forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub result: ResultInfo,
    pub tally: Tally,
}

impl Assessment {
    pub fn new(result: ResultInfo, tally: Tally) -> Self {
        Self { result, tally }
    }
}

/// What a rule can see while evaluating one source.
#[derive(Clone, Copy)]
pub struct SourceContext<'a> {
    pub store: &'a dyn AccountStore,
    pub subject: &'a Subject,
    pub source: &'a DataSource,
    pub record: &'a LocalRecord,
}

/// Closed set of eligibility rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    EditCount(EditCountRule),
    DateRegistered(DateRegisteredRule),
    NotBlocked(NotBlockedRule),
    NotBot(NotBotRule),
    HasGroupDuration(HasGroupDurationRule),
}

impl Rule {
    /// Evaluate against one source. `Ok(None)` means the rule does not apply there.
    pub fn evaluate(
        &self,
        context: &SourceContext<'_>,
        mode: Mode,
        prior: &Tally,
    ) -> Result<Option<Assessment>, StoreError> {
        match self {
            Rule::EditCount(rule) => rule.evaluate(context, mode, prior),
            Rule::DateRegistered(rule) => Ok(Some(rule.evaluate(context, prior))),
            Rule::NotBlocked(rule) => rule.evaluate(context, prior).map(Some),
            Rule::NotBot(rule) => rule.evaluate(context, prior).map(Some),
            Rule::HasGroupDuration(rule) => rule.evaluate(context, prior),
        }
    }

    /// A revocable pass can still be overturned by a later source, so it only settles
    /// once every source has been seen.
    pub fn revocable(&self) -> bool {
        matches!(self, Rule::NotBlocked(_) | Rule::NotBot(_))
    }

    pub fn default_mode(&self) -> Mode {
        match self {
            Rule::NotBlocked(_) => Mode::Accumulate,
            _ => Mode::OnAnyWiki,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rule::EditCount(_) => "edit_count",
            Rule::DateRegistered(_) => "date_registered",
            Rule::NotBlocked(_) => "not_blocked",
            Rule::NotBot(_) => "not_bot",
            Rule::HasGroupDuration(_) => "has_group_duration",
        }
    }

    pub fn describe(&self, mode: Mode) -> String {
        match self {
            Rule::EditCount(rule) => rule.describe(mode),
            Rule::DateRegistered(rule) => rule.describe(),
            Rule::NotBlocked(rule) => rule.describe(),
            Rule::NotBot(rule) => rule.describe(),
            Rule::HasGroupDuration(rule) => rule.describe(),
        }
    }

    pub(crate) fn validate(&self, mode: Mode) -> Result<(), RuleSetError> {
        let supported = match self {
            Rule::EditCount(_) => true,
            Rule::NotBlocked(_) => mode == Mode::Accumulate,
            Rule::DateRegistered(_) | Rule::NotBot(_) | Rule::HasGroupDuration(_) => {
                mode == Mode::OnAnyWiki
            }
        };
        if !supported {
            return Err(RuleSetError::UnsupportedMode {
                rule: self.name(),
                mode,
            });
        }

        let invalid = |reason: &str| RuleSetError::InvalidParameter {
            rule: self.name(),
            reason: reason.to_string(),
        };
        match self {
            Rule::EditCount(rule) => {
                if rule.min_edits == 0 {
                    return Err(invalid("min_edits must be positive"));
                }
                if let (Some(from), Some(until)) = (rule.window.from, rule.window.until) {
                    if from >= until {
                        return Err(invalid("window start must precede its end"));
                    }
                }
            }
            Rule::HasGroupDuration(rule) => {
                if rule.group.trim().is_empty() {
                    return Err(invalid("group must not be empty"));
                }
                if rule.min_months == 0 {
                    return Err(invalid("min_months must be positive"));
                }
            }
            Rule::DateRegistered(_) | Rule::NotBlocked(_) | Rule::NotBot(_) => {}
        }
        Ok(())
    }
}

impl From<EditCountRule> for Rule {
    fn from(rule: EditCountRule) -> Self {
        Rule::EditCount(rule)
    }
}

impl From<DateRegisteredRule> for Rule {
    fn from(rule: DateRegisteredRule) -> Self {
        Rule::DateRegistered(rule)
    }
}

impl From<NotBlockedRule> for Rule {
    fn from(rule: NotBlockedRule) -> Self {
        Rule::NotBlocked(rule)
    }
}

impl From<NotBotRule> for Rule {
    fn from(rule: NotBotRule) -> Self {
        Rule::NotBot(rule)
    }
}

impl From<HasGroupDurationRule> for Rule {
    fn from(rule: HasGroupDurationRule) -> Self {
        Rule::HasGroupDuration(rule)
    }
}
