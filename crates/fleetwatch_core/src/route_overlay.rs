use crate::{ids::VehicleId, selection::SelectionDetail, vehicle::position::Position};

/// The polyline currently drawn for the selected vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOverlay<R> {
    vehicle_id: VehicleId,
    points: Vec<Position>,
    color: String,
    handle: R,
}

impl<R> RouteOverlay<R> {
    pub fn new(vehicle_id: VehicleId, points: Vec<Position>, color: String, handle: R) -> Self {
        Self {
            vehicle_id,
            points,
            color,
            handle,
        }
    }

    pub fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    pub fn points(&self) -> &[Position] {
        &self.points
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn handle(&self) -> &R {
        &self.handle
    }

    pub fn into_handle(self) -> R {
        self.handle
    }

    fn shows(&self, route: &DesiredRoute<'_>) -> bool {
        &self.vehicle_id == route.vehicle_id
            && self.color == route.color
            && self.points == route.points
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesiredRoute<'a> {
    pub vehicle_id: &'a VehicleId,
    pub points: &'a [Position],
    pub color: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteAction<'a> {
    Keep,
    Draw(DesiredRoute<'a>),
    Replace(DesiredRoute<'a>),
    Remove,
}

/// A route is drawable once it has at least one leg.
pub fn desired_route(detail: Option<&SelectionDetail>) -> Option<DesiredRoute<'_>> {
    let detail = detail?;
    let points = detail.route_points();

    (points.len() >= 2).then_some(DesiredRoute {
        vehicle_id: detail.vehicle_id(),
        points,
        color: detail.polyline_color(),
    })
}

pub fn plan_route<'a, R>(
    current: Option<&RouteOverlay<R>>,
    desired: Option<DesiredRoute<'a>>,
) -> RouteAction<'a> {
    match (current, desired) {
        (None, None) => RouteAction::Keep,
        (Some(_), None) => RouteAction::Remove,
        (None, Some(route)) => RouteAction::Draw(route),
        (Some(overlay), Some(route)) if overlay.shows(&route) => RouteAction::Keep,
        (Some(_), Some(route)) => RouteAction::Replace(route),
    }
}
