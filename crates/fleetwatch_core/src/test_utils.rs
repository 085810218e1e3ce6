use fxhash::FxHashSet;
use jiff::Timestamp;

use crate::{
    ids::VehicleId,
    presentation::{MarkerUpdate, PresentationAdapter},
    vehicle::{
        heading::Heading,
        position::Position,
        record::{VehicleRecord, VehicleRecordBuilder},
        route::{AssignedRoute, RouteZone},
        snapshot::FleetSnapshot,
        status::VehicleStatus,
    },
};

pub const TEST_ROUTE_COLOR: &str = "#ff5722";

pub fn test_timestamp() -> Timestamp {
    "2025-06-10T08:00:00Z".parse().unwrap()
}

pub fn record(vehicle_id: &str, lat: f64, lng: f64) -> VehicleRecord {
    VehicleRecordBuilder::new(vehicle_id)
        .with_lat_lng(lat, lng)
        .with_status(VehicleStatus::OnRoute)
        .build()
}

/// A record on a two-waypoint route through `zones`, in the given order.
pub fn routed_record(vehicle_id: &str, lat: f64, lng: f64, zones: &[&str]) -> VehicleRecord {
    let route = AssignedRoute::new(
        format!("Route {vehicle_id}"),
        vec![
            Position::from_lat_lng(lat, lng).unwrap(),
            Position::from_lat_lng(lat + 0.01, lng + 0.01).unwrap(),
        ],
        Some(TEST_ROUTE_COLOR.to_owned()),
        zones
            .iter()
            .enumerate()
            .map(|(order, zone)| RouteZone::new(*zone, order as u32))
            .collect(),
    );

    VehicleRecordBuilder::new(vehicle_id)
        .with_lat_lng(lat, lng)
        .with_status(VehicleStatus::OnRoute)
        .with_assigned_route(route)
        .build()
}

pub fn snapshot(records: Vec<VehicleRecord>) -> FleetSnapshot {
    FleetSnapshot::new(test_timestamp(), records)
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCall {
    CreateMarker { vehicle_id: VehicleId, handle: u64 },
    UpdateMarker { handle: u64, update: MarkerUpdate },
    RemoveMarker { handle: u64 },
    DrawRoute { points: usize, color: String, handle: u64 },
    RemoveRoute { handle: u64 },
}

/// Presentation adapter that records every call and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingAdapter {
    next_handle: u64,
    calls: Vec<AdapterCall>,
    live_markers: FxHashSet<u64>,
    live_routes: FxHashSet<u64>,
    failing_creates: FxHashSet<VehicleId>,
    fail_route_draws: bool,
}

impl RecordingAdapter {
    pub fn calls(&self) -> &[AdapterCall] {
        &self.calls
    }

    pub fn live_markers(&self) -> usize {
        self.live_markers.len()
    }

    pub fn live_routes(&self) -> usize {
        self.live_routes.len()
    }

    pub fn fail_creates_for(&mut self, vehicle_id: &str) {
        self.failing_creates.insert(VehicleId::new(vehicle_id));
    }

    pub fn fail_route_draws(&mut self) {
        self.fail_route_draws = true;
    }

    pub fn clear_failures(&mut self) {
        self.failing_creates.clear();
        self.fail_route_draws = false;
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl PresentationAdapter for RecordingAdapter {
    type MarkerHandle = u64;
    type RouteHandle = u64;
    type Error = String;

    fn create_marker(
        &mut self,
        vehicle_id: &VehicleId,
        _position: Position,
        _heading: Heading,
        _status: VehicleStatus,
    ) -> Result<u64, String> {
        if self.failing_creates.contains(vehicle_id) {
            return Err(format!("marker icon for {vehicle_id} failed to load"));
        }

        let handle = self.next_handle();
        self.live_markers.insert(handle);
        self.calls.push(AdapterCall::CreateMarker {
            vehicle_id: vehicle_id.clone(),
            handle,
        });
        Ok(handle)
    }

    fn update_marker(&mut self, handle: &u64, update: &MarkerUpdate) -> Result<(), String> {
        if !self.live_markers.contains(handle) {
            return Err(format!("marker {handle} is not on the map"));
        }

        self.calls.push(AdapterCall::UpdateMarker {
            handle: *handle,
            update: *update,
        });
        Ok(())
    }

    fn remove_marker(&mut self, handle: u64) -> Result<(), String> {
        if !self.live_markers.remove(&handle) {
            return Err(format!("marker {handle} is not on the map"));
        }

        self.calls.push(AdapterCall::RemoveMarker { handle });
        Ok(())
    }

    fn draw_route(&mut self, points: &[Position], color: &str) -> Result<u64, String> {
        if self.fail_route_draws {
            return Err(String::from("polyline layer unavailable"));
        }

        let handle = self.next_handle();
        self.live_routes.insert(handle);
        self.calls.push(AdapterCall::DrawRoute {
            points: points.len(),
            color: color.to_owned(),
            handle,
        });
        Ok(handle)
    }

    fn remove_route(&mut self, handle: u64) -> Result<(), String> {
        if !self.live_routes.remove(&handle) {
            return Err(format!("route {handle} is not on the map"));
        }

        self.calls.push(AdapterCall::RemoveRoute { handle });
        Ok(())
    }
}
