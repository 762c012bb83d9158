use super::manager::Verdict;
use super::rules::Mode;
use crate::sources::StoreError;

/// Raised while building a rule set; malformed rules never reach evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleSetError {
    #[error("rule set must contain at least one rule")]
    Empty,
    #[error("{rule} cannot run in {mode:?} mode")]
    UnsupportedMode { rule: &'static str, mode: Mode },
    #[error("{rule}: {reason}")]
    InvalidParameter { rule: &'static str, reason: String },
}

/// Raised by `RuleManager::accumulate` and `RuleManager::conclude`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccumulateError {
    #[error("rule manager already reached a final {0:?} verdict")]
    AlreadyFinal(Verdict),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Engine faults surfaced by the orchestrator. Bad data never produces one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("engine invariant violated: {0}")]
    Invariant(AccumulateError),
}
