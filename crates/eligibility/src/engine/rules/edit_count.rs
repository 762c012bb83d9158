use super::{Assessment, Mode, SourceContext, Tally};
use crate::engine::result::ResultInfo;
use crate::sources::{DateWindow, StoreError};

/// Minimum number of edits inside a date window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCountRule {
    pub min_edits: u64,
    pub window: DateWindow,
}

impl EditCountRule {
    pub fn new(min_edits: u64, window: DateWindow) -> Self {
        Self { min_edits, window }
    }

    pub(super) fn evaluate(
        &self,
        context: &SourceContext<'_>,
        mode: Mode,
        prior: &Tally,
    ) -> Result<Option<Assessment>, StoreError> {
        // An account created after the window closed cannot have edited inside it.
        if let (Some(registered), Some(until)) =
            (context.record.registration.date(), self.window.until)
        {
            if registered >= until {
                return Ok(None);
            }
        }

        let count = context
            .store
            .edit_count(context.source, context.record.user_id, &self.window)?;
        let tally = Tally {
            edits: prior.edits.saturating_add(count),
            ..*prior
        };
        let window = self.window.describe();
        let source = &context.source.domain;

        let result = match mode {
            Mode::Accumulate if tally.edits >= self.min_edits => ResultInfo::pass(format!(
                "has {} edits {window} across visited sources ({count} on {source}, needs {})",
                tally.edits, self.min_edits
            )),
            Mode::Accumulate => ResultInfo::soft_pass(format!(
                "has {} of {} edits {window} so far ({count} on {source})",
                tally.edits, self.min_edits
            )),
            Mode::OnAnyWiki if count >= self.min_edits => ResultInfo::pass(format!(
                "has {count} edits {window} on {source} (needs {})",
                self.min_edits
            )),
            Mode::OnAnyWiki => ResultInfo::fail(
                format!(
                    "has {count} edits {window} on {source} (needs {})",
                    self.min_edits
                ),
                false,
            ),
        };

        Ok(Some(Assessment::new(result, tally)))
    }

    pub(super) fn describe(&self, mode: Mode) -> String {
        let scope = match mode {
            Mode::Accumulate => "combined across all sources",
            Mode::OnAnyWiki => "on a single source",
        };
        format!(
            "at least {} edits {} ({scope})",
            self.min_edits,
            self.window.describe()
        )
    }
}
