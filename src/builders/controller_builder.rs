//! Build admission controllers from configuration using provided factories.

use std::collections::HashMap;

use crate::config::AdmissionConfig;
use crate::core::{
    ActivityRecorder, AdmissionController, AdmissionError, AllocationStore, Resource,
    RequestLedger,
};
use crate::util::serde::ResourceId;

/// Build a controller from configuration, registering every configured
/// resource. Returns the controller and the label-to-id map for the seeded
/// resources.
///
/// The factories decide which concrete backend a config selection maps to;
/// the recorder factory may return `None` when recording is disabled.
pub fn build_controller<L, A, FL, FA, FR>(
    cfg: &AdmissionConfig,
    mut ledger_factory: FL,
    mut allocations_factory: FA,
    mut recorder_factory: FR,
) -> Result<(AdmissionController<L, A>, HashMap<String, ResourceId>), AdmissionError>
where
    L: RequestLedger,
    A: AllocationStore,
    FL: FnMut(&AdmissionConfig) -> Result<L, AdmissionError>,
    FA: FnMut(&AdmissionConfig) -> Result<A, AdmissionError>,
    FR: FnMut(&AdmissionConfig) -> Result<Option<Box<dyn ActivityRecorder>>, AdmissionError>,
{
    cfg.validate()
        .map_err(|e| AdmissionError::Backend(format!("config invalid: {e}")))?;

    let ledger = ledger_factory(cfg)?;
    let allocations = allocations_factory(cfg)?;
    let mut controller = AdmissionController::new(ledger, allocations)
        .with_max_conflict_retries(cfg.max_conflict_retries);
    if let Some(recorder) = recorder_factory(cfg)? {
        controller = controller.with_recorder(recorder);
    }

    let mut resources = HashMap::new();
    for (label, seed) in &cfg.resources {
        let resource = Resource::new(seed.capacity, seed.deadline_ms);
        let id = resource.id;
        controller.register(resource)?;
        resources.insert(label.clone(), id);
    }

    Ok((controller, resources))
}
