pub mod types;

pub use types::{
    FLEET_CHANNEL, JsonAssignedRoute, JsonDriver, JsonFeedFrame, JsonRouteZone,
    JsonScheduleSnapshot, JsonVehicleRecord, decode_records,
};
