use chrono::{Datelike, NaiveDate};

use super::{Assessment, SourceContext, Tally};
use crate::engine::result::ResultInfo;
use crate::sources::{RoleLogEvent, StoreError, LOGGING_EPOCH};

/// Subject must have held `group` without interruption for `min_months`, counting only
/// history up to `as_of`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasGroupDurationRule {
    pub group: String,
    pub min_months: u32,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval {
    start: NaiveDate,
    end: NaiveDate,
}

impl Interval {
    fn months(self) -> u32 {
        let mut months = (self.end.year() - self.start.year()) * 12 + self.end.month() as i32
            - self.start.month() as i32;
        if self.end.day() < self.start.day() {
            months -= 1;
        }
        months.max(0) as u32
    }
}

#[derive(Debug, Default)]
struct Tenure {
    longest: Option<Interval>,
    /// The log opens with a removal, so the start of that stint had to be guessed.
    assumed_start: bool,
}

impl HasGroupDurationRule {
    pub fn new(group: impl Into<String>, min_months: u32, as_of: NaiveDate) -> Self {
        Self {
            group: group.into(),
            min_months,
            as_of,
        }
    }

    pub(super) fn evaluate(
        &self,
        context: &SourceContext<'_>,
        prior: &Tally,
    ) -> Result<Option<Assessment>, StoreError> {
        let registration = context.record.registration;
        if registration.date().is_some_and(|date| date >= self.as_of) {
            return Ok(None);
        }

        let mut events =
            context
                .store
                .role_log(context.source, context.record.user_id, &self.group)?;
        // The mirror repeats some local changes; keep one copy of each.
        for event in context
            .store
            .mirror_role_log(context.source, context.subject, &self.group)?
        {
            if !events.contains(&event) {
                events.push(event);
            }
        }
        events.retain(|event| event.date <= self.as_of);
        // Stable on date alone: same-day changes replay in log order.
        events.sort_by_key(|event| event.date);

        let source = &context.source.domain;
        let group = &self.group;

        if events.is_empty() {
            let result = if registration.predates_logging() {
                ResultInfo::soft_pass(format!(
                    "no {group} log entries on {source}, but the account predates logging; \
                     tenure may be inaccurate and needs manual review"
                ))
            } else {
                ResultInfo::fail(format!("never held {group} on {source}"), false)
            };
            return Ok(Some(Assessment::new(result, *prior)));
        }

        let fallback_start = registration.date().unwrap_or(LOGGING_EPOCH);
        let tenure = longest_tenure(&events, fallback_start, self.as_of);

        let result = match tenure.longest {
            Some(interval) if interval.months() >= self.min_months && tenure.assumed_start => {
                ResultInfo::soft_pass(format!(
                    "held {group} on {source} for {} months ({} to {}) assuming it was held \
                     before the first logged change; tenure may be inaccurate",
                    interval.months(),
                    interval.start,
                    interval.end
                ))
            }
            Some(interval) if interval.months() >= self.min_months => {
                ResultInfo::pass(format!(
                    "held {group} on {source} for {} months ({} to {})",
                    interval.months(),
                    interval.start,
                    interval.end
                ))
            }
            Some(interval) => ResultInfo::fail(
                format!(
                    "longest {group} tenure on {source} was {} months ({} to {}); needs {}",
                    interval.months(),
                    interval.start,
                    interval.end,
                    self.min_months
                ),
                false,
            ),
            None => ResultInfo::fail(format!("never held {group} on {source}"), false),
        };

        Ok(Some(Assessment::new(result, *prior)))
    }

    pub(super) fn describe(&self) -> String {
        format!(
            "held {} for at least {} months as of {}",
            self.group, self.min_months, self.as_of
        )
    }
}

/// Replay grant/removal events in order and keep the longest unbroken held interval. A
/// stint still open at the end of the log runs until `as_of`.
fn longest_tenure(events: &[RoleLogEvent], fallback_start: NaiveDate, as_of: NaiveDate) -> Tenure {
    let mut tenure = Tenure::default();
    let mut held_since: Option<NaiveDate> = None;

    for (index, event) in events.iter().enumerate() {
        if event.held {
            held_since.get_or_insert(event.date);
            continue;
        }

        let start = match held_since.take() {
            Some(start) => start,
            None if index == 0 => {
                tenure.assumed_start = true;
                fallback_start.min(event.date)
            }
            None => continue,
        };
        record(&mut tenure, Interval {
            start,
            end: event.date,
        });
    }

    if let Some(start) = held_since {
        record(&mut tenure, Interval { start, end: as_of });
    }

    tenure
}

fn record(tenure: &mut Tenure, candidate: Interval) {
    let longer = tenure.longest.map_or(true, |current| {
        candidate.end - candidate.start > current.end - current.start
    });
    if longer {
        tenure.longest = Some(candidate);
    }
}
