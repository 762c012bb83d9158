//! Event-level eligibility checks over a configured account store.

mod batch;
pub mod router;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{EventCatalog, EventSummary};
use crate::engine::{Evaluation, EvaluationError, EvaluationLimits, Orchestrator, SourceSelection};
use crate::sources::{AccountStore, SourceId, Subject, SubjectError};

pub use batch::BatchSummary;
pub use router::eligibility_router;

/// Service composing the event catalog, the account store, and evaluation limits.
pub struct EligibilityService<S> {
    store: Arc<S>,
    catalog: Arc<EventCatalog>,
    limits: EvaluationLimits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRequest {
    pub username: String,
    pub event: String,
    /// Pin the check to one source instead of the event's default selection.
    #[serde(default)]
    pub source: Option<SourceId>,
}

impl EligibilityRequest {
    pub fn new(username: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            event: event.into(),
            source: None,
        }
    }

    pub fn on_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityReport {
    pub event: EventSummary,
    pub label: &'static str,
    pub summary: String,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

impl<S> EligibilityService<S>
where
    S: AccountStore + 'static,
{
    pub fn new(store: Arc<S>, catalog: EventCatalog, limits: EvaluationLimits) -> Self {
        Self {
            store,
            catalog: Arc::new(catalog),
            limits,
        }
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    pub fn events(&self) -> Vec<EventSummary> {
        self.catalog.events().iter().map(|event| event.summary()).collect()
    }

    /// Evaluate one username against one event.
    pub fn check(&self, request: &EligibilityRequest) -> Result<EligibilityReport, ServiceError> {
        let event = self
            .catalog
            .find(&request.event)
            .ok_or_else(|| ServiceError::UnknownEvent(request.event.clone()))?;
        let subject = Subject::new(&request.username)?;
        let selection = request
            .source
            .clone()
            .map_or(SourceSelection::Auto, SourceSelection::Pinned);

        let evaluation = Orchestrator::new(self.store.as_ref())
            .with_limits(self.limits)
            .evaluate(&subject, event.rule_set(), &selection)?;

        info!(
            event = %event.id,
            subject = %subject,
            outcome = evaluation.outcome.label(),
            sources = evaluation.trace.len(),
            "eligibility checked"
        );

        Ok(EligibilityReport {
            event: event.summary(),
            label: evaluation.outcome.label(),
            summary: evaluation.summary(),
            evaluation,
        })
    }
}

/// Error raised by the eligibility service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error(transparent)]
    Subject(#[from] SubjectError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error("batch file: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
