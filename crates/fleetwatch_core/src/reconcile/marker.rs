use fxhash::FxHashMap;

use crate::{
    ids::VehicleId,
    presentation::MarkerUpdate,
    vehicle::{heading::Heading, position::Position, status::VehicleStatus},
};

/// What is currently rendered for one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerState<H> {
    position: Position,
    heading: Heading,
    status: VehicleStatus,
    handle: H,
}

impl<H> MarkerState<H> {
    pub fn new(position: Position, heading: Heading, status: VehicleStatus, handle: H) -> Self {
        Self {
            position,
            heading,
            status,
            handle,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn into_handle(self) -> H {
        self.handle
    }

    /// Changed attributes only; empty when nothing visible moved.
    pub fn diff(&self, position: Position, heading: Heading, status: VehicleStatus) -> MarkerUpdate {
        MarkerUpdate {
            position: (position != self.position).then_some(position),
            heading: (heading != self.heading).then_some(heading),
            status: (status != self.status).then_some(status),
        }
    }

    pub(crate) fn apply(&mut self, update: &MarkerUpdate) {
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(heading) = update.heading {
            self.heading = heading;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}

/// Handles of every rendered marker, keyed by vehicle id. Owned by a single
/// view and threaded through `reconcile`/`apply_plan` explicitly.
#[derive(Debug, Clone)]
pub struct MarkerRegistry<H> {
    markers: FxHashMap<VehicleId, MarkerState<H>>,
}

impl<H> Default for MarkerRegistry<H> {
    fn default() -> Self {
        Self {
            markers: FxHashMap::default(),
        }
    }
}

impl<H> MarkerRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, vehicle_id: &VehicleId) -> Option<&MarkerState<H>> {
        self.markers.get(vehicle_id)
    }

    pub fn contains(&self, vehicle_id: &VehicleId) -> bool {
        self.markers.contains_key(vehicle_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VehicleId, &MarkerState<H>)> {
        self.markers.iter()
    }

    pub fn vehicle_ids(&self) -> impl Iterator<Item = &VehicleId> {
        self.markers.keys()
    }

    pub fn insert(&mut self, vehicle_id: VehicleId, marker: MarkerState<H>) -> Option<MarkerState<H>> {
        self.markers.insert(vehicle_id, marker)
    }

    pub fn remove(&mut self, vehicle_id: &VehicleId) -> Option<MarkerState<H>> {
        self.markers.remove(vehicle_id)
    }

    pub(crate) fn get_mut(&mut self, vehicle_id: &VehicleId) -> Option<&mut MarkerState<H>> {
        self.markers.get_mut(vehicle_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_reports_only_changed_attributes() {
        let position = Position::from_lat_lng(14.0, 121.0).unwrap();
        let moved = Position::from_lat_lng(14.001, 121.0).unwrap();
        let marker = MarkerState::new(position, Heading::new(90.0), VehicleStatus::OnRoute, 1u64);

        assert!(marker
            .diff(position, Heading::new(90.0), VehicleStatus::OnRoute)
            .is_empty());

        let update = marker.diff(moved, Heading::new(90.0), VehicleStatus::Complete);
        assert_eq!(update.position, Some(moved));
        assert_eq!(update.heading, None);
        assert_eq!(update.status, Some(VehicleStatus::Complete));
    }

    #[test]
    fn test_apply_update() {
        let position = Position::from_lat_lng(14.0, 121.0).unwrap();
        let mut marker = MarkerState::new(position, Heading::NORTH, VehicleStatus::Active, 1u64);

        marker.apply(&MarkerUpdate {
            heading: Some(Heading::new(180.0)),
            ..MarkerUpdate::default()
        });

        assert_eq!(marker.heading(), Heading::new(180.0));
        assert_eq!(marker.position(), position);
        assert_eq!(marker.status(), VehicleStatus::Active);
    }
}
