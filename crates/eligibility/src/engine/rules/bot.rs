use super::{Assessment, SourceContext, Tally};
use crate::engine::result::ResultInfo;
use crate::sources::StoreError;

const BOT_GROUP: &str = "bot";

/// Flags bot accounts for a reviewer instead of failing them; a bot flag on one source
/// does not prove the global account is automated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotBotRule;

impl NotBotRule {
    pub(super) fn evaluate(
        &self,
        context: &SourceContext<'_>,
        prior: &Tally,
    ) -> Result<Assessment, StoreError> {
        let groups = context
            .store
            .groups(context.source, context.record.user_id)?;
        let source = &context.source.domain;

        let result = if groups.iter().any(|group| group == BOT_GROUP) {
            ResultInfo::soft_pass(format!(
                "has the bot flag on {source}; confirm this is not an automated account"
            ))
        } else {
            ResultInfo::pass(format!("no bot flag on {source}"))
        };

        Ok(Assessment::new(result, *prior))
    }

    pub(super) fn describe(&self) -> String {
        "not a bot".to_string()
    }
}
