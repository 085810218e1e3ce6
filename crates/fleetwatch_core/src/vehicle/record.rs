use crate::ids::VehicleId;

use super::{
    heading::Heading,
    position::Position,
    route::AssignedRoute,
    schedule::{Driver, ScheduleContext},
    status::VehicleStatus,
};

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRecord {
    vehicle_id: VehicleId,
    position: Option<Position>,
    heading: Heading,
    status: VehicleStatus,
    assigned_route: Option<AssignedRoute>,
    driver: Option<Driver>,
    schedule: ScheduleContext,
}

impl VehicleRecord {
    pub fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Records without a position are kept in snapshots but never rendered.
    pub fn is_renderable(&self) -> bool {
        self.position.is_some()
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    pub fn assigned_route(&self) -> Option<&AssignedRoute> {
        self.assigned_route.as_ref()
    }

    pub fn driver(&self) -> Option<&Driver> {
        self.driver.as_ref()
    }

    pub fn schedule(&self) -> &ScheduleContext {
        &self.schedule
    }
}

pub struct VehicleRecordBuilder {
    vehicle_id: VehicleId,
    position: Option<Position>,
    heading: Option<Heading>,
    status: Option<VehicleStatus>,
    assigned_route: Option<AssignedRoute>,
    driver: Option<Driver>,
    schedule: Option<ScheduleContext>,
}

impl VehicleRecordBuilder {
    pub fn new(vehicle_id: impl Into<VehicleId>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            position: None,
            heading: None,
            status: None,
            assigned_route: None,
            driver: None,
            schedule: None,
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Invalid coordinates leave the record without a position.
    pub fn with_lat_lng(mut self, lat: f64, lng: f64) -> Self {
        self.position = Position::from_lat_lng(lat, lng);
        self
    }

    pub fn with_heading(mut self, heading: impl Into<Heading>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn with_status(mut self, status: VehicleStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_assigned_route(mut self, route: AssignedRoute) -> Self {
        self.assigned_route = Some(route);
        self
    }

    pub fn with_driver(mut self, driver: Driver) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn with_schedule(mut self, schedule: ScheduleContext) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn build(self) -> VehicleRecord {
        VehicleRecord {
            vehicle_id: self.vehicle_id,
            position: self.position,
            heading: self.heading.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            assigned_route: self.assigned_route,
            driver: self.driver,
            schedule: self.schedule.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let record = VehicleRecordBuilder::new("T-1").build();

        assert_eq!(record.vehicle_id().as_str(), "T-1");
        assert!(!record.is_renderable());
        assert_eq!(record.heading(), Heading::NORTH);
        assert_eq!(record.status(), VehicleStatus::Unknown);
        assert!(record.assigned_route().is_none());
        assert_eq!(record.schedule(), &ScheduleContext::default());
    }

    #[test]
    fn test_invalid_coordinates_leave_record_unrenderable() {
        let record = VehicleRecordBuilder::new("T-1")
            .with_lat_lng(f64::NAN, 121.0)
            .build();

        assert!(record.position().is_none());
    }
}
