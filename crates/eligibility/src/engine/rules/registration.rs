use chrono::NaiveDate;

use super::{Assessment, SourceContext, Tally};
use crate::engine::result::ResultInfo;
use crate::sources::Registration;

/// Account must have been registered strictly before `before`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRegisteredRule {
    pub before: NaiveDate,
}

impl DateRegisteredRule {
    pub fn new(before: NaiveDate) -> Self {
        Self { before }
    }

    pub(super) fn evaluate(&self, context: &SourceContext<'_>, prior: &Tally) -> Assessment {
        let source = &context.source.domain;
        let result = match context.record.registration {
            Registration::On(date) if date < self.before => ResultInfo::pass(format!(
                "registered on {source} on {date} (before {})",
                self.before
            )),
            Registration::On(date) => ResultInfo::fail(
                format!(
                    "registered on {source} on {date} (must be before {})",
                    self.before
                ),
                false,
            ),
            Registration::Unknown => ResultInfo::soft_pass(format!(
                "registration date on {source} predates logging and cannot be verified \
                 against {}; confirm manually",
                self.before
            )),
        };
        Assessment::new(result, *prior)
    }

    pub(super) fn describe(&self) -> String {
        format!("registered before {}", self.before)
    }
}
