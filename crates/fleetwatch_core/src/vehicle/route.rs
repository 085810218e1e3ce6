use crate::ids::ZoneId;

use super::{meters::Meters, position::Position};

/// A zone served by a route, tagged with its stop order along the route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteZone {
    zone_id: ZoneId,
    order: u32,
}

impl RouteZone {
    pub fn new(zone_id: impl Into<ZoneId>, order: u32) -> Self {
        Self {
            zone_id: zone_id.into(),
            order,
        }
    }

    pub fn zone_id(&self) -> &ZoneId {
        &self.zone_id
    }

    pub fn order(&self) -> u32 {
        self.order
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignedRoute {
    name: String,
    waypoints: Vec<Position>,
    color: Option<String>,
    zones: Vec<RouteZone>,
}

impl AssignedRoute {
    pub fn new(
        name: impl Into<String>,
        waypoints: Vec<Position>,
        color: Option<String>,
        mut zones: Vec<RouteZone>,
    ) -> Self {
        zones.sort_by_key(|zone| zone.order);

        Self {
            name: name.into(),
            waypoints,
            color: color.filter(|color| !color.trim().is_empty()),
            zones,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn waypoints(&self) -> &[Position] {
        &self.waypoints
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Zones in route order.
    pub fn zones(&self) -> &[RouteZone] {
        &self.zones
    }

    pub fn touches_zone(&self, zone_id: &ZoneId) -> bool {
        self.zones.iter().any(|zone| &zone.zone_id == zone_id)
    }

    pub fn length(&self) -> Meters {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].haversine_distance(&pair[1]))
            .sum()
    }
}
