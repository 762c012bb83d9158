use serde::{Deserialize, Serialize};

use super::error::RuleSetError;
use super::result::ResultInfo;
use super::rules::{Assessment, Mode, Rule, SourceContext, Tally};
use crate::sources::StoreError;

/// Per-entry workflow modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub mode: Mode,
    /// Any fail from this entry ends the evaluation.
    pub hard_fail_on_fail: bool,
    /// A fail stops the remaining entries for the current source only.
    pub skip_remaining_on_fail: bool,
}

impl Workflow {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            hard_fail_on_fail: false,
            skip_remaining_on_fail: false,
        }
    }

    pub fn hard_fail(mut self) -> Self {
        self.hard_fail_on_fail = true;
        self
    }

    pub fn skip_remaining(mut self) -> Self {
        self.skip_remaining_on_fail = true;
        self
    }
}

/// A rule bound to its workflow flags, plus the state it accumulates over sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    rule: Rule,
    workflow: Workflow,
    is_final: bool,
    tally: Tally,
    last: Option<ResultInfo>,
}

impl RuleEntry {
    pub fn new(rule: impl Into<Rule>, workflow: Workflow) -> Result<Self, RuleSetError> {
        let rule = rule.into();
        rule.validate(workflow.mode)?;
        Ok(Self {
            rule,
            workflow,
            is_final: false,
            tally: Tally::default(),
            last: None,
        })
    }

    /// Entry using the rule's default mode and no extra flags.
    pub fn simple(rule: impl Into<Rule>) -> Result<Self, RuleSetError> {
        let rule = rule.into();
        let workflow = Workflow::new(rule.default_mode());
        Self::new(rule, workflow)
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn workflow(&self) -> Workflow {
        self.workflow
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Standing carried across sources: the latest result, except that a revocable rule
    /// keeps an earlier soft-pass warning over later passes.
    pub fn last_result(&self) -> Option<&ResultInfo> {
        self.last.as_ref()
    }

    pub fn describe(&self) -> String {
        self.rule.describe(self.workflow.mode)
    }

    /// Evaluate against one source and commit the outcome. Final entries are skipped.
    pub fn accumulate(
        &mut self,
        context: &SourceContext<'_>,
    ) -> Result<Option<ResultInfo>, StoreError> {
        match self.assess(context)? {
            Some(assessment) => Ok(Some(self.commit(assessment))),
            None => Ok(None),
        }
    }

    pub(crate) fn assess(
        &self,
        context: &SourceContext<'_>,
    ) -> Result<Option<Assessment>, StoreError> {
        if self.is_final {
            return Ok(None);
        }
        self.rule.evaluate(context, self.workflow.mode, &self.tally)
    }

    pub(crate) fn commit(&mut self, assessment: Assessment) -> ResultInfo {
        let Assessment { result, tally } = assessment;
        self.tally = tally;

        let settled_fail = result.is_fail() && self.is_hard_fail(&result);
        let settled_pass = result.is_pass() && !self.rule.revocable();
        if settled_fail || settled_pass {
            self.is_final = true;
        }

        // A revocable rule's warning from an earlier source outlives later clean passes.
        let keeps_warning = self.rule.revocable()
            && result.is_pass()
            && self.last.as_ref().is_some_and(ResultInfo::is_soft_pass);
        if !keeps_warning {
            self.last = Some(result.clone());
        }
        result
    }

    pub(crate) fn is_hard_fail(&self, result: &ResultInfo) -> bool {
        result.is_fail() && (result.is_final() || self.workflow.hard_fail_on_fail)
    }

    /// Whether this entry has settled on a pass that no later source can change.
    pub(crate) fn settled_pass(&self) -> bool {
        self.is_final && self.last.as_ref().is_some_and(ResultInfo::is_pass)
    }

    /// Settle a still-open entry once there are no sources left. Only an entry that never
    /// produced a result changes; every other standing is kept as the last source left it.
    pub(crate) fn conclude(&mut self) -> Option<ResultInfo> {
        if self.is_final {
            return None;
        }
        self.is_final = true;

        if self.last.is_some() {
            return None;
        }
        let conclusion = ResultInfo::fail(
            format!(
                "no visited source could evaluate: {}",
                self.rule.describe(self.workflow.mode)
            ),
            true,
        );
        self.last = Some(conclusion.clone());
        Some(conclusion)
    }
}
