use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{EligibilityRequest, EligibilityService, ServiceError};
use crate::engine::Outcome;
use crate::sources::AccountStore;

#[derive(Debug, Deserialize)]
struct BatchRow {
    username: String,
}

#[derive(Debug, Serialize)]
struct BatchRecord<'a> {
    username: &'a str,
    event: &'a str,
    outcome: &'a str,
    sources_visited: usize,
    summary: String,
}

/// Counts per outcome for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub checked: usize,
    pub eligible: usize,
    pub not_eligible: usize,
    pub needs_review: usize,
    pub inconclusive: usize,
    pub invalid: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &Outcome) {
        self.checked += 1;
        match outcome {
            Outcome::Pass => self.eligible += 1,
            Outcome::Fail => self.not_eligible += 1,
            Outcome::SoftPass => self.needs_review += 1,
            Outcome::Inconclusive { .. } => self.inconclusive += 1,
        }
    }
}

impl<S> EligibilityService<S>
where
    S: AccountStore + 'static,
{
    /// Check every username in a CSV with a `username` column against `event`, writing
    /// one result row per username. Invalid usernames are reported in place rather than
    /// aborting the run.
    pub fn check_batch<R: Read, W: Write>(
        &self,
        event: &str,
        input: R,
        output: W,
    ) -> Result<BatchSummary, ServiceError> {
        if self.catalog.find(event).is_none() {
            return Err(ServiceError::UnknownEvent(event.to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(input);
        let mut writer = csv::Writer::from_writer(output);
        let mut summary = BatchSummary::default();

        for row in reader.deserialize::<BatchRow>() {
            let row = row?;
            let request = EligibilityRequest::new(row.username.as_str(), event);

            let record = match self.check(&request) {
                Ok(report) => {
                    summary.record(&report.evaluation.outcome);
                    BatchRecord {
                        username: &row.username,
                        event,
                        outcome: report.label,
                        sources_visited: report.evaluation.trace.len(),
                        summary: report.summary,
                    }
                }
                Err(ServiceError::Subject(err)) => {
                    warn!(username = %row.username, %err, "skipping invalid username");
                    summary.invalid += 1;
                    BatchRecord {
                        username: &row.username,
                        event,
                        outcome: "invalid",
                        sources_visited: 0,
                        summary: err.to_string(),
                    }
                }
                Err(err) => return Err(err),
            };
            writer.serialize(record)?;
        }

        writer.flush()?;
        info!(
            event = %event,
            checked = summary.checked,
            eligible = summary.eligible,
            invalid = summary.invalid,
            "batch complete"
        );
        Ok(summary)
    }
}
