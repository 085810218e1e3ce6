use fxhash::FxHashSet;

use crate::{
    ids::VehicleId,
    presentation::MarkerUpdate,
    vehicle::{
        heading::Heading, position::Position, snapshot::FleetSnapshot, status::VehicleStatus,
    },
};

use super::marker::MarkerRegistry;

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerOperation {
    Remove {
        vehicle_id: VehicleId,
    },
    Update {
        vehicle_id: VehicleId,
        update: MarkerUpdate,
    },
    Create {
        vehicle_id: VehicleId,
        position: Position,
        heading: Heading,
        status: VehicleStatus,
    },
}

impl MarkerOperation {
    pub fn vehicle_id(&self) -> &VehicleId {
        match self {
            MarkerOperation::Remove { vehicle_id }
            | MarkerOperation::Update { vehicle_id, .. }
            | MarkerOperation::Create { vehicle_id, .. } => vehicle_id,
        }
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, MarkerOperation::Remove { .. })
    }

    pub fn is_update(&self) -> bool {
        matches!(self, MarkerOperation::Update { .. })
    }

    pub fn is_create(&self) -> bool {
        matches!(self, MarkerOperation::Create { .. })
    }
}

/// Operations in application order: removes, then updates, then creates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconcilePlan {
    operations: Vec<MarkerOperation>,
    removes: usize,
    updates: usize,
}

impl ReconcilePlan {
    pub fn operations(&self) -> &[MarkerOperation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn removes(&self) -> &[MarkerOperation] {
        &self.operations[..self.removes]
    }

    pub fn updates(&self) -> &[MarkerOperation] {
        &self.operations[self.removes..self.removes + self.updates]
    }

    pub fn creates(&self) -> &[MarkerOperation] {
        &self.operations[self.removes + self.updates..]
    }
}

/// Diffs the rendered markers against the next (already scope-filtered)
/// snapshot. Pure: neither argument is modified.
pub fn reconcile<H>(previous: &MarkerRegistry<H>, next: &FleetSnapshot) -> ReconcilePlan {
    let mut updates = Vec::new();
    let mut creates = Vec::new();
    let mut present: FxHashSet<&VehicleId> = FxHashSet::default();

    for record in next.vehicles() {
        let Some(position) = record.position() else {
            continue;
        };

        present.insert(record.vehicle_id());

        match previous.get(record.vehicle_id()) {
            Some(marker) => {
                let update = marker.diff(position, record.heading(), record.status());
                if !update.is_empty() {
                    updates.push(MarkerOperation::Update {
                        vehicle_id: record.vehicle_id().clone(),
                        update,
                    });
                }
            }
            None => creates.push(MarkerOperation::Create {
                vehicle_id: record.vehicle_id().clone(),
                position,
                heading: record.heading(),
                status: record.status(),
            }),
        }
    }

    // Registry iteration order is not stable across maps, sort for a deterministic plan.
    let mut removed = previous
        .vehicle_ids()
        .filter(|vehicle_id| !present.contains(vehicle_id))
        .collect::<Vec<_>>();
    removed.sort();

    let removes = removed.len();
    let update_count = updates.len();

    let mut operations = Vec::with_capacity(removes + update_count + creates.len());
    operations.extend(removed.into_iter().map(|vehicle_id| MarkerOperation::Remove {
        vehicle_id: vehicle_id.clone(),
    }));
    operations.extend(updates);
    operations.extend(creates);

    ReconcilePlan {
        operations,
        removes,
        updates: update_count,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        reconcile::marker::MarkerState,
        test_utils,
        vehicle::record::VehicleRecordBuilder,
    };

    use super::*;

    fn registry(markers: &[(&str, f64, f64)]) -> MarkerRegistry<u64> {
        let mut registry = MarkerRegistry::new();
        for (handle, (vehicle_id, lat, lng)) in markers.iter().enumerate() {
            registry.insert(
                VehicleId::new(vehicle_id),
                MarkerState::new(
                    Position::from_lat_lng(*lat, *lng).unwrap(),
                    Heading::NORTH,
                    VehicleStatus::Unknown,
                    handle as u64,
                ),
            );
        }
        registry
    }

    #[test]
    fn test_empty_previous_creates_every_vehicle() {
        let next = test_utils::snapshot(vec![
            test_utils::record("A", 14.0, 121.0),
            test_utils::record("B", 14.1, 121.1),
        ]);

        let plan = reconcile(&MarkerRegistry::<u64>::new(), &next);

        assert_eq!(plan.creates().len(), 2);
        assert!(plan.updates().is_empty());
        assert!(plan.removes().is_empty());
        assert!(plan.operations().iter().all(MarkerOperation::is_create));
    }

    #[test]
    fn test_unchanged_vehicle_yields_no_operations() {
        let previous = registry(&[("A", 14.0, 121.0)]);
        let next = test_utils::snapshot(vec![test_utils::record("A", 14.0, 121.0)]);

        assert!(reconcile(&previous, &next).is_empty());
    }

    #[test]
    fn test_missing_vehicle_is_removed() {
        let previous = registry(&[("A", 14.0, 121.0), ("B", 14.1, 121.1)]);
        let next = test_utils::snapshot(vec![test_utils::record("B", 14.1, 121.1)]);

        let plan = reconcile(&previous, &next);

        assert_eq!(
            plan.operations(),
            &[MarkerOperation::Remove {
                vehicle_id: VehicleId::new("A")
            }]
        );
    }

    #[test]
    fn test_update_carries_only_changed_attributes() {
        let previous = registry(&[("A", 14.0, 121.0)]);
        let next = test_utils::snapshot(vec![
            VehicleRecordBuilder::new("A")
                .with_lat_lng(14.0, 121.0)
                .with_heading(45.0)
                .build(),
        ]);

        let plan = reconcile(&previous, &next);

        assert_eq!(
            plan.operations(),
            &[MarkerOperation::Update {
                vehicle_id: VehicleId::new("A"),
                update: MarkerUpdate {
                    heading: Some(Heading::new(45.0)),
                    ..MarkerUpdate::default()
                },
            }]
        );
    }

    #[test]
    fn test_vehicle_without_position_is_never_created_or_updated() {
        let previous = registry(&[("A", 14.0, 121.0)]);
        let next = test_utils::snapshot(vec![
            VehicleRecordBuilder::new("A").build(),
            VehicleRecordBuilder::new("B").build(),
        ]);

        let plan = reconcile(&previous, &next);

        assert!(plan.creates().is_empty());
        assert!(plan.updates().is_empty());
        assert_eq!(plan.removes().len(), 1);
        assert_eq!(plan.removes()[0].vehicle_id().as_str(), "A");
    }

    #[test]
    fn test_operations_are_ordered_removes_updates_creates() {
        let previous = registry(&[("A", 14.0, 121.0), ("B", 14.1, 121.1), ("C", 14.2, 121.2)]);
        let next = test_utils::snapshot(vec![
            test_utils::record("D", 14.3, 121.3),
            test_utils::record("B", 14.15, 121.1),
            test_utils::record("C", 14.2, 121.2),
        ]);

        let plan = reconcile(&previous, &next);
        let kinds = plan
            .operations()
            .iter()
            .map(|operation| match operation {
                MarkerOperation::Remove { .. } => "remove",
                MarkerOperation::Update { .. } => "update",
                MarkerOperation::Create { .. } => "create",
            })
            .collect::<Vec<_>>();

        assert_eq!(kinds, vec!["remove", "update", "create"]);
        assert_eq!(plan.removes()[0].vehicle_id().as_str(), "A");
        assert_eq!(plan.updates()[0].vehicle_id().as_str(), "B");
        assert_eq!(plan.creates()[0].vehicle_id().as_str(), "D");
    }

    #[test]
    fn test_reconcile_is_repeatable() {
        let previous = registry(&[("A", 14.0, 121.0), ("B", 14.1, 121.1), ("C", 14.2, 121.2)]);
        let next = test_utils::snapshot(vec![
            test_utils::record("B", 14.15, 121.1),
            test_utils::record("E", 14.4, 121.4),
        ]);

        let first = reconcile(&previous, &next);
        let second = reconcile(&previous, &next);

        assert_eq!(first, second);
        assert_eq!(previous.len(), 3);
    }
}
