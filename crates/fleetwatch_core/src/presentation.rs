use std::fmt::Display;

use thiserror::Error;

use crate::{
    ids::VehicleId,
    vehicle::{heading::Heading, position::Position, status::VehicleStatus},
};

/// The visual attributes of a marker that changed since the last render.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarkerUpdate {
    pub position: Option<Position>,
    pub heading: Option<Heading>,
    pub status: Option<VehicleStatus>,
}

impl MarkerUpdate {
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.heading.is_none() && self.status.is_none()
    }
}

/// The drawing surface. Implementations own the actual map objects; the engine
/// only keeps their handles.
pub trait PresentationAdapter {
    type MarkerHandle;
    type RouteHandle;
    type Error: Display;

    fn create_marker(
        &mut self,
        vehicle_id: &VehicleId,
        position: Position,
        heading: Heading,
        status: VehicleStatus,
    ) -> Result<Self::MarkerHandle, Self::Error>;

    fn update_marker(
        &mut self,
        handle: &Self::MarkerHandle,
        update: &MarkerUpdate,
    ) -> Result<(), Self::Error>;

    fn remove_marker(&mut self, handle: Self::MarkerHandle) -> Result<(), Self::Error>;

    fn draw_route(&mut self, points: &[Position], color: &str)
    -> Result<Self::RouteHandle, Self::Error>;

    fn remove_route(&mut self, handle: Self::RouteHandle) -> Result<(), Self::Error>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PresentationError {
    #[error("Failed to create marker for {vehicle_id}: {message}")]
    CreateMarker {
        vehicle_id: VehicleId,
        message: String,
    },

    #[error("Failed to update marker for {vehicle_id}: {message}")]
    UpdateMarker {
        vehicle_id: VehicleId,
        message: String,
    },

    #[error("Failed to remove marker for {vehicle_id}: {message}")]
    RemoveMarker {
        vehicle_id: VehicleId,
        message: String,
    },

    #[error("Failed to draw route for {vehicle_id}: {message}")]
    DrawRoute {
        vehicle_id: VehicleId,
        message: String,
    },

    #[error("Failed to remove route for {vehicle_id}: {message}")]
    RemoveRoute {
        vehicle_id: VehicleId,
        message: String,
    },
}

impl PresentationError {
    pub fn vehicle_id(&self) -> &VehicleId {
        match self {
            PresentationError::CreateMarker { vehicle_id, .. }
            | PresentationError::UpdateMarker { vehicle_id, .. }
            | PresentationError::RemoveMarker { vehicle_id, .. }
            | PresentationError::DrawRoute { vehicle_id, .. }
            | PresentationError::RemoveRoute { vehicle_id, .. } => vehicle_id,
        }
    }
}
