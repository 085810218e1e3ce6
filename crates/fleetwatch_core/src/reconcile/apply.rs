use jiff::Timestamp;
use tracing::{debug, warn};

use crate::{
    presentation::{PresentationAdapter, PresentationError},
    vehicle::snapshot::FleetSnapshot,
};

use super::{
    marker::{MarkerRegistry, MarkerState},
    plan::{MarkerOperation, ReconcilePlan, reconcile},
};

/// Counts only operations the adapter accepted.
pub struct ApplyOutcome<H> {
    pub registry: MarkerRegistry<H>,
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub errors: Vec<PresentationError>,
}

impl<H> ApplyOutcome<H> {
    pub fn applied(&self) -> usize {
        self.created + self.updated + self.removed
    }
}

/// Executes a plan against the adapter and returns the registry that now
/// matches what is drawn. A failing operation is reported and the rest of the
/// batch still runs:
/// - failed create: no entry, the next diff creates it again
/// - failed update: the old state is kept, the next diff updates it again
/// - failed remove: the entry is dropped anyway
pub fn apply_plan<A>(
    mut registry: MarkerRegistry<A::MarkerHandle>,
    plan: &ReconcilePlan,
    adapter: &mut A,
) -> ApplyOutcome<A::MarkerHandle>
where
    A: PresentationAdapter,
{
    let mut created = 0;
    let mut updated = 0;
    let mut removed = 0;
    let mut errors = Vec::new();

    for operation in plan.operations() {
        match operation {
            MarkerOperation::Remove { vehicle_id } => {
                let Some(marker) = registry.remove(vehicle_id) else {
                    debug!(%vehicle_id, "No marker to remove");
                    continue;
                };

                match adapter.remove_marker(marker.into_handle()) {
                    Ok(()) => removed += 1,
                    Err(err) => {
                        warn!(%vehicle_id, error = %err, "Failed to remove marker");
                        errors.push(PresentationError::RemoveMarker {
                            vehicle_id: vehicle_id.clone(),
                            message: err.to_string(),
                        });
                    }
                }
            }
            MarkerOperation::Update { vehicle_id, update } => {
                let Some(marker) = registry.get_mut(vehicle_id) else {
                    debug!(%vehicle_id, "No marker to update");
                    continue;
                };

                match adapter.update_marker(marker.handle(), update) {
                    Ok(()) => {
                        marker.apply(update);
                        updated += 1;
                    }
                    Err(err) => {
                        warn!(%vehicle_id, error = %err, "Failed to update marker");
                        errors.push(PresentationError::UpdateMarker {
                            vehicle_id: vehicle_id.clone(),
                            message: err.to_string(),
                        });
                    }
                }
            }
            MarkerOperation::Create {
                vehicle_id,
                position,
                heading,
                status,
            } => {
                if registry.contains(vehicle_id) {
                    debug!(%vehicle_id, "Marker already exists, skipping create");
                    continue;
                }

                match adapter.create_marker(vehicle_id, *position, *heading, *status) {
                    Ok(handle) => {
                        registry.insert(
                            vehicle_id.clone(),
                            MarkerState::new(*position, *heading, *status, handle),
                        );
                        created += 1;
                    }
                    Err(err) => {
                        warn!(%vehicle_id, error = %err, "Failed to create marker");
                        errors.push(PresentationError::CreateMarker {
                            vehicle_id: vehicle_id.clone(),
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
    }

    ApplyOutcome {
        registry,
        created,
        updated,
        removed,
        errors,
    }
}

/// Removes every rendered marker.
pub fn release_all<A>(
    registry: MarkerRegistry<A::MarkerHandle>,
    adapter: &mut A,
) -> Vec<PresentationError>
where
    A: PresentationAdapter,
{
    let plan = reconcile(&registry, &FleetSnapshot::empty(Timestamp::now()));
    let outcome = apply_plan(registry, &plan, adapter);
    outcome.errors
}
