use super::{Assessment, SourceContext, Tally};
use crate::engine::result::ResultInfo;
use crate::sources::StoreError;

/// Subject may be blocked on at most `max_blocked_sources` sources overall.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotBlockedRule {
    pub max_blocked_sources: u32,
}

impl NotBlockedRule {
    pub fn new(max_blocked_sources: u32) -> Self {
        Self {
            max_blocked_sources,
        }
    }

    pub(super) fn evaluate(
        &self,
        context: &SourceContext<'_>,
        prior: &Tally,
    ) -> Result<Assessment, StoreError> {
        let status = context
            .store
            .block_status(context.source, context.record.user_id)?;
        let source = &context.source.domain;

        if !status.blocked {
            let result = ResultInfo::pass(format!("not blocked on {source}"));
            return Ok(Assessment::new(result, *prior));
        }

        let tally = Tally {
            blocked_sources: prior.blocked_sources.saturating_add(1),
            ..*prior
        };
        let kind = if status.indefinite {
            "indefinitely blocked"
        } else {
            "blocked"
        };

        // The count only grows, so exceeding the allowance can never be undone.
        let result = if tally.blocked_sources > self.max_blocked_sources {
            ResultInfo::fail(
                format!(
                    "{kind} on {source}; blocked on {} sources (allowed {})",
                    tally.blocked_sources, self.max_blocked_sources
                ),
                true,
            )
        } else {
            ResultInfo::pass(format!(
                "{kind} on {source}; blocked on {} of at most {} sources",
                tally.blocked_sources, self.max_blocked_sources
            ))
        };

        Ok(Assessment::new(result, tally))
    }

    pub(super) fn describe(&self) -> String {
        match self.max_blocked_sources {
            0 => "not blocked on any source".to_string(),
            1 => "not blocked on more than one source".to_string(),
            max => format!("not blocked on more than {max} sources"),
        }
    }
}
