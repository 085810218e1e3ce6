use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};
use serde_json::Value;
use serde_with::{DefaultOnError, OneOrMany, VecSkipError, formats::PreferMany, serde_as};
use tracing::debug;

use crate::{
    ids::{DriverId, VehicleId, ZoneId},
    vehicle::{
        position::Position,
        record::{VehicleRecord, VehicleRecordBuilder},
        route::{AssignedRoute, RouteZone},
        schedule::{Driver, ScheduleContext},
        status::VehicleStatus,
    },
};

pub const FLEET_CHANNEL: &str = "fleet";

/// One vehicle/schedule record as sent by the feed and the schedule endpoint.
/// Every field is optional on the wire and a field of the wrong type reads as
/// absent; `into_record` decides what is usable. Alternate spellings are kept
/// as separate fields so a record carrying both still decodes.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "VehicleRecord")]
pub struct JsonVehicleRecord {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<VehicleId>,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing)]
    pub truck_id: Option<VehicleId>,

    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing)]
    pub lat: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing)]
    pub lng: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing)]
    pub lon: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub heading: Option<f64>,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<JsonAssignedRoute>,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<JsonDriver>,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub garbage_type: Option<String>,

    /// A single string or an array of strings. Entries may hold several
    /// comma separated days; `into_record` splits them.
    #[serde_as(as = "DefaultOnError<OneOrMany<_, PreferMany>>")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days: Vec<String>,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_status: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "AssignedRoute")]
pub struct JsonAssignedRoute {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub name: Option<String>,

    /// `[lat, lng]` pairs in driving order. Unreadable pairs are skipped.
    #[serde_as(as = "DefaultOnError<VecSkipError<_>>")]
    #[serde(default, alias = "waypoints")]
    pub points: Vec<[f64; 2]>,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub color: Option<String>,

    #[serde_as(as = "DefaultOnError<VecSkipError<_>>")]
    #[serde(default, alias = "barangays")]
    pub zones: Vec<JsonRouteZone>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "RouteZone")]
pub struct JsonRouteZone {
    #[serde(alias = "barangay_id")]
    pub zone_id: ZoneId,

    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Driver")]
pub struct JsonDriver {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub id: Option<DriverId>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub name: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub contact: Option<String>,
}

/// Text frame pushed on the live feed connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "FeedFrame")]
pub struct JsonFeedFrame {
    #[serde(alias = "channel")]
    pub name: String,

    #[serde(default)]
    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<Timestamp>,
}

impl JsonFeedFrame {
    pub fn fleet(records: Vec<Value>, sequence: Option<u64>, captured_at: Option<Timestamp>) -> Self {
        Self {
            name: FLEET_CHANNEL.to_owned(),
            data: Value::Array(records),
            sequence,
            captured_at,
        }
    }

    pub fn is_fleet(&self) -> bool {
        self.name.trim().eq_ignore_ascii_case(FLEET_CHANNEL)
    }
}

/// Response of the schedule endpoint: every schedule for the day, and the
/// subset the backend already matched to the requested zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "ScheduleSnapshot")]
pub struct JsonScheduleSnapshot {
    #[serde(default, alias = "all")]
    pub schedules: Vec<Value>,

    #[serde(default, alias = "zone")]
    pub zone_schedules: Vec<Value>,
}

impl JsonVehicleRecord {
    /// `None` when the record has no usable vehicle id.
    pub fn into_record(self) -> Option<VehicleRecord> {
        let vehicle_id = self
            .vehicle_id
            .filter(|vehicle_id| !vehicle_id.is_blank())
            .or(self.truck_id.filter(|truck_id| !truck_id.is_blank()))?;

        let schedule = ScheduleContext {
            garbage_type: self.garbage_type,
            days: split_days(self.days),
            remark: self.remark,
            status: self.schedule_status,
        };

        let mut builder = VehicleRecordBuilder::new(vehicle_id)
            .with_heading(self.heading.unwrap_or(0.0))
            .with_status(
                self.status
                    .as_deref()
                    .map(VehicleStatus::parse)
                    .unwrap_or_default(),
            )
            .with_schedule(schedule);

        let lat = self.latitude.or(self.lat);
        let lng = self.longitude.or(self.lng).or(self.lon);
        if let (Some(lat), Some(lng)) = (lat, lng) {
            builder = builder.with_lat_lng(lat, lng);
        }

        if let Some(route) = self.route {
            builder = builder.with_assigned_route(route.into());
        }

        if let Some(driver) = self.driver.and_then(JsonDriver::into_driver) {
            builder = builder.with_driver(driver);
        }

        Some(builder.build())
    }
}

impl From<&VehicleRecord> for JsonVehicleRecord {
    fn from(record: &VehicleRecord) -> Self {
        let schedule = record.schedule();

        JsonVehicleRecord {
            vehicle_id: Some(record.vehicle_id().clone()),
            truck_id: None,
            latitude: record.position().map(|position| position.lat()),
            lat: None,
            longitude: record.position().map(|position| position.lng()),
            lng: None,
            lon: None,
            heading: Some(record.heading().degrees()),
            status: Some(record.status().as_str().to_owned()),
            route: record.assigned_route().map(JsonAssignedRoute::from),
            driver: record.driver().map(|driver| JsonDriver {
                id: driver.id().cloned(),
                name: Some(driver.name().to_owned()),
                contact: driver.contact().map(str::to_owned),
            }),
            garbage_type: schedule.garbage_type.clone(),
            days: schedule.days.clone(),
            remark: schedule.remark.clone(),
            schedule_status: schedule.status.clone(),
        }
    }
}

impl From<JsonAssignedRoute> for AssignedRoute {
    fn from(route: JsonAssignedRoute) -> Self {
        let waypoints = route
            .points
            .iter()
            .filter_map(|[lat, lng]| Position::from_lat_lng(*lat, *lng))
            .collect();

        let zones = route
            .zones
            .into_iter()
            .enumerate()
            .map(|(index, zone)| RouteZone::new(zone.zone_id, zone.order.unwrap_or(index as u32)))
            .collect();

        AssignedRoute::new(route.name.unwrap_or_default(), waypoints, route.color, zones)
    }
}

impl From<&AssignedRoute> for JsonAssignedRoute {
    fn from(route: &AssignedRoute) -> Self {
        JsonAssignedRoute {
            name: Some(route.name().to_owned()),
            points: route
                .waypoints()
                .iter()
                .map(|position| [position.lat(), position.lng()])
                .collect(),
            color: route.color().map(str::to_owned),
            zones: route
                .zones()
                .iter()
                .map(|zone| JsonRouteZone {
                    zone_id: zone.zone_id().clone(),
                    order: Some(zone.order()),
                })
                .collect(),
        }
    }
}

impl JsonDriver {
    fn into_driver(self) -> Option<Driver> {
        if self.id.is_none() && self.name.is_none() {
            return None;
        }

        Some(Driver::new(
            self.id,
            self.name.unwrap_or_default(),
            self.contact,
        ))
    }
}

/// Decodes records one by one so a single malformed record only drops itself.
pub fn decode_records(values: impl IntoIterator<Item = Value>) -> Vec<VehicleRecord> {
    let mut records = Vec::new();

    for value in values {
        match serde_json::from_value::<JsonVehicleRecord>(value) {
            Ok(record) => match record.into_record() {
                Some(record) => records.push(record),
                None => debug!("Dropping fleet record without a vehicle id"),
            },
            Err(err) => debug!(error = %err, "Dropping malformed fleet record"),
        }
    }

    records
}

fn split_days(days: Vec<String>) -> Vec<String> {
    days.iter()
        .flat_map(|day| day.split(','))
        .map(str::trim)
        .filter(|day| !day.is_empty())
        .map(str::to_owned)
        .collect()
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(value)) => Some(value),
        Some(Raw::Text(text)) => text.trim().parse::<f64>().ok(),
        Some(Raw::Other(_)) | None => None,
    })
}
