use jiff::Timestamp;
use tracing::debug;

use crate::{
    ids::VehicleId,
    vehicle::{
        meters::Meters, position::Position, record::VehicleRecord, snapshot::FleetSnapshot,
    },
};

pub const DEFAULT_POLYLINE_COLOR: &str = "#1e88e5";

/// Detail panel contents for the selected vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionDetail {
    record: VehicleRecord,
    polyline_color: String,
    route_point_count: usize,
    route_length: Meters,
    captured_at: Timestamp,
}

impl SelectionDetail {
    pub fn from_record(record: &VehicleRecord, captured_at: Timestamp) -> Self {
        let route = record.assigned_route();

        Self {
            record: record.clone(),
            polyline_color: route
                .and_then(|route| route.color())
                .unwrap_or(DEFAULT_POLYLINE_COLOR)
                .to_owned(),
            route_point_count: route.map_or(0, |route| route.waypoints().len()),
            route_length: route.map_or(Meters::ZERO, |route| route.length()),
            captured_at,
        }
    }

    pub fn record(&self) -> &VehicleRecord {
        &self.record
    }

    pub fn vehicle_id(&self) -> &VehicleId {
        self.record.vehicle_id()
    }

    pub fn polyline_color(&self) -> &str {
        &self.polyline_color
    }

    pub fn route_point_count(&self) -> usize {
        self.route_point_count
    }

    pub fn route_length(&self) -> Meters {
        self.route_length
    }

    pub fn route_points(&self) -> &[Position] {
        self.record
            .assigned_route()
            .map(|route| route.waypoints())
            .unwrap_or_default()
    }

    /// Capture instant of the snapshot this detail was taken from.
    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionChange {
    /// Nothing is selected.
    #[default]
    None,
    /// Selected, but the vehicle has not been seen yet.
    Pending,
    /// A pending selection received its first detail.
    Materialized,
    /// The detail was replaced with a newer record.
    Refreshed,
    /// The vehicle was missing; the previous detail stays displayed.
    Retained,
    /// The selection was dismissed.
    Cleared,
}

#[derive(Debug, Clone, PartialEq)]
struct Selected {
    vehicle_id: VehicleId,
    detail: Option<SelectionDetail>,
    stale: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: Option<Selected>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(
        &mut self,
        vehicle_id: VehicleId,
        latest: Option<&FleetSnapshot>,
    ) -> SelectionChange {
        let detail = latest.and_then(|snapshot| {
            snapshot
                .get(&vehicle_id)
                .map(|record| SelectionDetail::from_record(record, snapshot.captured_at()))
        });

        let change = if detail.is_some() {
            SelectionChange::Materialized
        } else {
            debug!(%vehicle_id, "Selected vehicle not in latest snapshot, detail pending");
            SelectionChange::Pending
        };

        self.selected = Some(Selected {
            vehicle_id,
            detail,
            stale: false,
        });

        change
    }

    pub fn clear(&mut self) -> SelectionChange {
        match self.selected.take() {
            Some(_) => SelectionChange::Cleared,
            None => SelectionChange::None,
        }
    }

    /// Replaces the detail wholesale when the selected vehicle is present.
    /// A missing vehicle never clears an existing detail.
    pub fn on_snapshot(&mut self, snapshot: &FleetSnapshot) -> SelectionChange {
        let Some(selected) = self.selected.as_mut() else {
            return SelectionChange::None;
        };

        match snapshot.get(&selected.vehicle_id) {
            Some(record) => {
                let was_pending = selected.detail.is_none();
                selected.detail = Some(SelectionDetail::from_record(record, snapshot.captured_at()));
                selected.stale = false;

                if was_pending {
                    SelectionChange::Materialized
                } else {
                    SelectionChange::Refreshed
                }
            }
            None if selected.detail.is_some() => {
                selected.stale = true;
                SelectionChange::Retained
            }
            None => SelectionChange::Pending,
        }
    }

    pub fn vehicle_id(&self) -> Option<&VehicleId> {
        self.selected.as_ref().map(|selected| &selected.vehicle_id)
    }

    pub fn detail(&self) -> Option<&SelectionDetail> {
        self.selected
            .as_ref()
            .and_then(|selected| selected.detail.as_ref())
    }

    pub fn is_selected(&self) -> bool {
        self.selected.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.selected
            .as_ref()
            .is_some_and(|selected| selected.detail.is_none())
    }

    /// The displayed detail is from an older snapshot than the latest one.
    pub fn is_stale(&self) -> bool {
        self.selected.as_ref().is_some_and(|selected| selected.stale)
    }
}
