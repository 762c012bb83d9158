use eligibility::config::EvaluationSettings;
use eligibility::error::AppError;
use eligibility::sources::FixtureStore;
use eligibility::{EligibilityService, EventCatalog};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Account data from `override_path`, else the configured snapshot, else an empty store.
pub(crate) fn load_store(
    settings: &EvaluationSettings,
    override_path: Option<&Path>,
) -> Result<FixtureStore, AppError> {
    match override_path.or(settings.data_path.as_deref()) {
        Some(path) => {
            let store = FixtureStore::from_path(path)?;
            info!(path = %path.display(), sources = store.sources().len(), "loaded account data");
            Ok(store)
        }
        None => {
            warn!("no account data configured; every check will be inconclusive");
            Ok(FixtureStore::default())
        }
    }
}

pub(crate) fn build_service(
    settings: &EvaluationSettings,
    override_path: Option<&Path>,
) -> Result<EligibilityService<FixtureStore>, AppError> {
    let store = load_store(settings, override_path)?;
    let catalog = EventCatalog::builtin()?;
    Ok(EligibilityService::new(
        Arc::new(store),
        catalog,
        settings.limits(),
    ))
}
