use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::catalog::EventCatalog;
use crate::engine::EvaluationLimits;
use crate::service::EligibilityService;
use crate::sources::{DataSource, FixtureAccount, FixtureStore};

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Catalog with a single accumulate-mode event, so tests do not depend on shipped data.
pub(super) fn catalog() -> EventCatalog {
    EventCatalog::from_json(
        r#"{ "events": [
            {
                "id": "test-election",
                "year": 2024,
                "name": "Test election",
                "url": "https://example.org/election",
                "rules": [
                    { "rule": "not_blocked", "max_blocked_sources": 0, "hard_fail": true },
                    { "rule": "edit_count", "min_edits": 500, "until": "2024-01-01", "mode": "accumulate" }
                ],
                "extra_requirements": ["Must confirm identity with the committee."]
            },
            {
                "id": "enwiki-only",
                "year": 2023,
                "name": "Local vote",
                "url": "https://example.org/local",
                "required_source": "enwiki",
                "rules": [{ "rule": "date_registered", "before": "2015-01-01" }]
            }
        ] }"#,
    )
    .expect("test catalog is valid")
}

pub(super) fn store() -> FixtureStore {
    FixtureStore::default()
        .with_source(DataSource::new("enwiki", "en.wikipedia.org"))
        .with_source(DataSource::new("dewiki", "de.wikipedia.org"))
        .with_account(
            FixtureAccount::new("Veteran editor", "enwiki", 11)
                .registered(date(2012, 4, 2))
                .with_edits(date(2016, 1, 1), 320),
        )
        .with_account(
            FixtureAccount::new("Veteran editor", "dewiki", 12)
                .registered(date(2013, 8, 9))
                .with_edits(date(2019, 5, 5), 240),
        )
        .with_account(
            FixtureAccount::new("Newcomer", "dewiki", 21)
                .registered(date(2023, 10, 1))
                .with_edits(date(2023, 11, 1), 40),
        )
        .with_account(
            FixtureAccount::new("Troublemaker", "enwiki", 31)
                .registered(date(2011, 1, 1))
                .with_edits(date(2014, 1, 1), 4_000)
                .blocked(true),
        )
}

pub(super) fn service() -> EligibilityService<FixtureStore> {
    EligibilityService::new(Arc::new(store()), catalog(), EvaluationLimits::default())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
