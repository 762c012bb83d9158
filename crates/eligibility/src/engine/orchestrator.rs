use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn};

use super::error::{AccumulateError, EvaluationError};
use super::manager::{RuleManager, Verdict};
use super::result::ResultInfo;
use super::rule_set::RuleSet;
use super::rules::SourceContext;
use crate::sources::{AccountStore, DataSource, SourceId, SourcePresence, StoreError, Subject};

/// Which sources to visit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSelection {
    /// The rule set's required source if it declares one, otherwise every source where
    /// the subject has an account.
    #[default]
    Auto,
    /// Only this source.
    Pinned(SourceId),
}

/// Host-imposed bounds on one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationLimits {
    pub max_sources: Option<usize>,
    pub time_budget: Option<Duration>,
}

impl EvaluationLimits {
    fn reached(&self, evaluated: usize, elapsed: Duration) -> bool {
        self.max_sources.is_some_and(|max| evaluated >= max)
            || self.time_budget.is_some_and(|budget| elapsed >= budget)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InconclusiveReason {
    /// The subject has no account on any selected source.
    NoAccount,
    /// Every queued source was closed or unreachable.
    NoEvaluableSource,
    /// The list of sources could not be fetched.
    PresenceUnavailable,
    /// A time or source limit stopped the evaluation early.
    Interrupted,
}

impl InconclusiveReason {
    pub fn describe(self) -> &'static str {
        match self {
            InconclusiveReason::NoAccount => "no account found",
            InconclusiveReason::NoEvaluableSource => "no source could be evaluated",
            InconclusiveReason::PresenceUnavailable => "account lookup unavailable",
            InconclusiveReason::Interrupted => "evaluation stopped before a verdict",
        }
    }
}

/// What the caller is told.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
    /// Not disqualified, but a reviewer must confirm.
    SoftPass,
    Inconclusive { reason: InconclusiveReason },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass => "eligible",
            Outcome::Fail => "not eligible",
            Outcome::SoftPass => "needs review",
            Outcome::Inconclusive { .. } => "inconclusive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VisitStatus {
    Evaluated,
    SkippedClosed,
    NoLocalAccount,
    Unreachable { error: String },
}

/// One entry of the per-source trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceVisit {
    pub source: SourceId,
    pub domain: String,
    #[serde(flatten)]
    pub status: VisitStatus,
    pub results: Vec<ResultInfo>,
}

impl SourceVisit {
    fn new(source: &DataSource, status: VisitStatus) -> Self {
        Self {
            source: source.id.clone(),
            domain: source.domain.clone(),
            status,
            results: Vec::new(),
        }
    }
}

/// Where each rule ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleStanding {
    pub requirement: String,
    pub result: Option<ResultInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub subject: Subject,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub verdict: Verdict,
    pub trace: Vec<SourceVisit>,
    /// Results produced when the queue ran out without a final verdict.
    pub conclusion: Vec<ResultInfo>,
    pub standings: Vec<RuleStanding>,
}

impl Evaluation {
    fn inconclusive(
        subject: &Subject,
        reason: InconclusiveReason,
        manager: Option<&RuleManager>,
        trace: Vec<SourceVisit>,
    ) -> Self {
        Self {
            subject: subject.clone(),
            outcome: Outcome::Inconclusive { reason },
            verdict: manager.map_or(Verdict::Accumulating, RuleManager::verdict),
            trace,
            conclusion: Vec::new(),
            standings: manager.map(standings_of).unwrap_or_default(),
        }
    }

    pub fn sources_evaluated(&self) -> usize {
        self.trace
            .iter()
            .filter(|visit| visit.status == VisitStatus::Evaluated)
            .count()
    }

    /// One-line explanation suitable for listings.
    pub fn summary(&self) -> String {
        let messages = |keep: fn(&ResultInfo) -> bool| {
            self.standings
                .iter()
                .filter_map(|standing| standing.result.as_ref())
                .filter(|result| keep(result))
                .map(|result| result.message().to_string())
                .collect::<Vec<_>>()
                .join("; ")
        };

        match self.outcome {
            Outcome::Pass => format!(
                "eligible ({} source(s) checked)",
                self.sources_evaluated()
            ),
            Outcome::Fail => format!("not eligible: {}", messages(ResultInfo::is_fail)),
            Outcome::SoftPass => format!("needs review: {}", messages(ResultInfo::is_soft_pass)),
            Outcome::Inconclusive { reason } => format!("inconclusive: {}", reason.describe()),
        }
    }
}

fn standings_of(manager: &RuleManager) -> Vec<RuleStanding> {
    manager
        .entries()
        .iter()
        .map(|entry| RuleStanding {
            requirement: entry.describe(),
            result: entry.last_result().cloned(),
        })
        .collect()
}

fn outcome_for(verdict: Verdict) -> Outcome {
    match verdict {
        Verdict::Pass => Outcome::Pass,
        Verdict::Fail => Outcome::Fail,
        Verdict::SoftPass => Outcome::SoftPass,
        Verdict::Accumulating => Outcome::Inconclusive {
            reason: InconclusiveReason::Interrupted,
        },
    }
}

/// Drives a fresh rule manager over the subject's sources, one at a time, until it
/// reaches a final verdict or runs out of sources.
pub struct Orchestrator<'a> {
    store: &'a dyn AccountStore,
    limits: EvaluationLimits,
}

impl<'a> Orchestrator<'a> {
    pub fn new(store: &'a dyn AccountStore) -> Self {
        Self {
            store,
            limits: EvaluationLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: EvaluationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn evaluate(
        &self,
        subject: &Subject,
        rules: &RuleSet,
        selection: &SourceSelection,
    ) -> Result<Evaluation, EvaluationError> {
        let span = info_span!("evaluate", subject = %subject);
        let _entered = span.enter();

        let mut queue = match self.queue(subject, rules, selection) {
            Ok(queue) => queue,
            Err(err) => {
                warn!(%err, "unable to list sources for subject");
                return Ok(Evaluation::inconclusive(
                    subject,
                    InconclusiveReason::PresenceUnavailable,
                    None,
                    Vec::new(),
                ));
            }
        };

        if queue.is_empty() {
            info!("no account on any selected source");
            return Ok(Evaluation::inconclusive(
                subject,
                InconclusiveReason::NoAccount,
                None,
                Vec::new(),
            ));
        }

        let mut manager = rules.manager();
        let mut trace = Vec::with_capacity(queue.len());
        let mut evaluated = 0usize;
        let started = Instant::now();

        while let Some(presence) = queue.pop_front() {
            if self.limits.reached(evaluated, started.elapsed()) {
                warn!(
                    evaluated,
                    remaining = queue.len() + 1,
                    "evaluation limits reached before a verdict"
                );
                return Ok(Evaluation::inconclusive(
                    subject,
                    InconclusiveReason::Interrupted,
                    Some(&manager),
                    trace,
                ));
            }

            let visit = self.visit(subject, &presence.source, &mut manager)?;
            if visit.status == VisitStatus::Evaluated {
                evaluated += 1;
            }
            trace.push(visit);

            if manager.is_final() {
                break;
            }
        }

        if evaluated == 0 {
            let reason = if trace
                .iter()
                .all(|visit| visit.status == VisitStatus::NoLocalAccount)
            {
                InconclusiveReason::NoAccount
            } else {
                InconclusiveReason::NoEvaluableSource
            };
            info!(reason = reason.describe(), "no source evaluated");
            return Ok(Evaluation::inconclusive(subject, reason, Some(&manager), trace));
        }

        let conclusion = if manager.is_final() {
            Vec::new()
        } else {
            manager.conclude().map_err(EvaluationError::Invariant)?
        };

        let verdict = manager.verdict();
        info!(?verdict, evaluated, "evaluation complete");

        Ok(Evaluation {
            subject: subject.clone(),
            outcome: outcome_for(verdict),
            verdict,
            trace,
            conclusion,
            standings: standings_of(&manager),
        })
    }

    fn queue(
        &self,
        subject: &Subject,
        rules: &RuleSet,
        selection: &SourceSelection,
    ) -> Result<VecDeque<SourcePresence>, StoreError> {
        let mut presences = self.store.presence_sources(subject)?;

        let target = match selection {
            SourceSelection::Pinned(source) => Some(source),
            SourceSelection::Auto => rules.required_source(),
        };
        if let Some(target) = target {
            presences.retain(|presence| &presence.source.id == target);
            presences.truncate(1);
            return Ok(presences.into());
        }

        // Least evidence first, so accumulation has the best chance of crossing its
        // thresholds before the queue runs out.
        presences.sort_by(|a, b| {
            a.edit_count
                .cmp(&b.edit_count)
                .then_with(|| a.source.id.cmp(&b.source.id))
        });
        Ok(presences.into())
    }

    fn visit(
        &self,
        subject: &Subject,
        source: &DataSource,
        manager: &mut RuleManager,
    ) -> Result<SourceVisit, EvaluationError> {
        if source.closed {
            debug!(source = %source.id, "skipping closed source");
            return Ok(SourceVisit::new(source, VisitStatus::SkippedClosed));
        }

        let record = match self.store.local_record(source, subject) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(source = %source.id, "no local account");
                return Ok(SourceVisit::new(source, VisitStatus::NoLocalAccount));
            }
            Err(err) => return Ok(unreachable_visit(source, err)),
        };

        let context = SourceContext {
            store: self.store,
            subject,
            source,
            record: &record,
        };

        match manager.accumulate(&context) {
            Ok(results) => {
                debug!(
                    source = %source.id,
                    verdict = ?manager.verdict(),
                    results = results.len(),
                    "source evaluated"
                );
                let mut visit = SourceVisit::new(source, VisitStatus::Evaluated);
                visit.results = results;
                Ok(visit)
            }
            Err(AccumulateError::Store(err)) => Ok(unreachable_visit(source, err)),
            Err(err) => {
                error!(%err, "accumulate called after a final verdict");
                Err(EvaluationError::Invariant(err))
            }
        }
    }
}

fn unreachable_visit(source: &DataSource, err: StoreError) -> SourceVisit {
    warn!(source = %source.id, %err, "source unreachable; skipping");
    SourceVisit::new(
        source,
        VisitStatus::Unreachable {
            error: err.to_string(),
        },
    )
}
