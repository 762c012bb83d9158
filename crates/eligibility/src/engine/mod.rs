//! Multi-source rule accumulation.
//!
//! A [`RuleManager`] owns an ordered list of [`RuleEntry`] values and is fed one source at
//! a time by the [`Orchestrator`]. Each entry wraps a [`Rule`] and yields a three-valued
//! [`ResultInfo`] per source (or nothing when the rule does not apply there); the manager
//! folds those into a [`Verdict`] and goes final on a settled pass or a hard fail. When
//! the sources run out first, [`RuleManager::conclude`] settles whatever is still open.

mod entry;
mod error;
mod manager;
mod orchestrator;
mod result;
mod rule_set;
pub mod rules;

#[cfg(test)]
mod tests;

pub use entry::{RuleEntry, Workflow};
pub use error::{AccumulateError, EvaluationError, RuleSetError};
pub use manager::{RuleManager, Verdict};
pub use orchestrator::{
    Evaluation, EvaluationLimits, InconclusiveReason, Orchestrator, Outcome, RuleStanding,
    SourceSelection, SourceVisit, VisitStatus,
};
pub use result::{Passed, ResultInfo};
pub use rule_set::RuleSet;
pub use rules::{
    DateRegisteredRule, EditCountRule, HasGroupDurationRule, Mode, NotBlockedRule, NotBotRule,
    Rule, SourceContext, Tally,
};
