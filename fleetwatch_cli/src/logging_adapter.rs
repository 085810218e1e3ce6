use std::convert::Infallible;

use fleetwatch_core::{
    ids::VehicleId,
    presentation::{MarkerUpdate, PresentationAdapter},
    vehicle::{heading::Heading, position::Position, status::VehicleStatus},
};
use tracing::info;

/// Presentation adapter for terminals: every drawing call becomes a log line.
#[derive(Debug, Default)]
pub struct LoggingAdapter {
    next_handle: u64,
    live_markers: usize,
    live_routes: usize,
}

impl LoggingAdapter {
    pub fn live_markers(&self) -> usize {
        self.live_markers
    }

    pub fn live_routes(&self) -> usize {
        self.live_routes
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl PresentationAdapter for LoggingAdapter {
    type MarkerHandle = u64;
    type RouteHandle = u64;
    type Error = Infallible;

    fn create_marker(
        &mut self,
        vehicle_id: &VehicleId,
        position: Position,
        heading: Heading,
        status: VehicleStatus,
    ) -> Result<u64, Infallible> {
        let handle = self.next_handle();
        self.live_markers += 1;

        info!(
            marker = handle,
            %vehicle_id,
            lat = position.lat(),
            lng = position.lng(),
            %heading,
            %status,
            "+ marker"
        );
        Ok(handle)
    }

    fn update_marker(&mut self, handle: &u64, update: &MarkerUpdate) -> Result<(), Infallible> {
        info!(
            marker = handle,
            lat = update.position.map(|position| position.lat()),
            lng = update.position.map(|position| position.lng()),
            heading = update.heading.map(|heading| heading.degrees()),
            status = update.status.map(|status| status.as_str()),
            "~ marker"
        );
        Ok(())
    }

    fn remove_marker(&mut self, handle: u64) -> Result<(), Infallible> {
        self.live_markers = self.live_markers.saturating_sub(1);
        info!(marker = handle, "- marker");
        Ok(())
    }

    fn draw_route(&mut self, points: &[Position], color: &str) -> Result<u64, Infallible> {
        let handle = self.next_handle();
        self.live_routes += 1;

        info!(route = handle, points = points.len(), color, "+ route");
        Ok(handle)
    }

    fn remove_route(&mut self, handle: u64) -> Result<(), Infallible> {
        self.live_routes = self.live_routes.saturating_sub(1);
        info!(route = handle, "- route");
        Ok(())
    }
}
