use serde::{Deserialize, Serialize};

use super::entry::RuleEntry;
use super::error::{AccumulateError, RuleSetError};
use super::result::ResultInfo;
use super::rules::SourceContext;

/// Aggregate state of a rule manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accumulating,
    Pass,
    SoftPass,
    Fail,
}

/// Evidence gathered by one `accumulate` call, before the transition is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CallTally {
    pub(crate) all_passed: bool,
    pub(crate) all_passed_or_soft_passed: bool,
    pub(crate) any_hard_fail: bool,
}

/// Next verdict and whether it is final. A full pass is checked before a hard fail so a
/// subject who qualifies on this source is never failed by a flag raised in the same call.
pub(crate) fn transition(tally: CallTally) -> (Verdict, bool) {
    if tally.all_passed {
        (Verdict::Pass, true)
    } else if tally.all_passed_or_soft_passed {
        (Verdict::SoftPass, false)
    } else if tally.any_hard_fail {
        (Verdict::Fail, true)
    } else {
        (Verdict::Accumulating, false)
    }
}

/// Accumulates rule results for one subject over a sequence of sources.
#[derive(Debug, Clone)]
pub struct RuleManager {
    entries: Vec<RuleEntry>,
    verdict: Verdict,
    is_final: bool,
}

impl RuleManager {
    pub fn new(entries: Vec<RuleEntry>) -> Result<Self, RuleSetError> {
        if entries.is_empty() {
            return Err(RuleSetError::Empty);
        }
        Ok(Self::from_entries(entries))
    }

    pub(crate) fn from_entries(entries: Vec<RuleEntry>) -> Self {
        Self {
            entries,
            verdict: Verdict::Accumulating,
            is_final: false,
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// Feed one source through every open entry and recompute the verdict.
    ///
    /// Results for the source are staged before any entry is updated, so a store failure
    /// part-way through leaves the manager exactly as it was.
    pub fn accumulate(
        &mut self,
        context: &SourceContext<'_>,
    ) -> Result<Vec<ResultInfo>, AccumulateError> {
        if self.is_final {
            return Err(AccumulateError::AlreadyFinal(self.verdict));
        }

        let mut staged = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            let Some(assessment) = entry.assess(context)? else {
                continue;
            };
            let stop = assessment.result.is_fail() && entry.workflow().skip_remaining_on_fail;
            staged.push((index, assessment));
            if stop {
                break;
            }
        }

        let mut any_hard_fail = false;
        let mut results = Vec::with_capacity(staged.len());
        for (index, assessment) in staged {
            let entry = &mut self.entries[index];
            let result = entry.commit(assessment);
            any_hard_fail |= entry.is_hard_fail(&result);
            results.push(result);
        }

        let tally = CallTally {
            all_passed: self.entries.iter().all(RuleEntry::settled_pass),
            all_passed_or_soft_passed: self.entries.iter().all(|entry| {
                entry
                    .last_result()
                    .is_some_and(|result| !result.is_fail())
            }),
            any_hard_fail,
        };
        let (verdict, is_final) = transition(tally);
        self.verdict = verdict;
        self.is_final = is_final;

        Ok(results)
    }

    /// Settle the verdict once no sources remain. Standings are kept as they are, so any
    /// failing entry fails the subject, unanimous passes pass and anything else (an edit
    /// shortfall included) goes to manual review.
    pub fn conclude(&mut self) -> Result<Vec<ResultInfo>, AccumulateError> {
        if self.is_final {
            return Err(AccumulateError::AlreadyFinal(self.verdict));
        }

        let conclusions: Vec<ResultInfo> = self
            .entries
            .iter_mut()
            .filter_map(RuleEntry::conclude)
            .collect();

        let any_failed = self
            .entries
            .iter()
            .filter_map(RuleEntry::last_result)
            .any(ResultInfo::is_fail);
        let all_passed = self
            .entries
            .iter()
            .filter_map(RuleEntry::last_result)
            .all(ResultInfo::is_pass);

        self.verdict = if any_failed {
            Verdict::Fail
        } else if all_passed {
            Verdict::Pass
        } else {
            Verdict::SoftPass
        };
        self.is_final = true;

        Ok(conclusions)
    }
}
