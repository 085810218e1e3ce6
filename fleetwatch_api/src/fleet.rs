use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fleetwatch_core::{
    ids::ZoneId,
    json::{JsonScheduleSnapshot, JsonVehicleRecord},
    vehicle::schedule::parse_weekday,
};
use jiff::civil::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::{
    error::ApiError,
    state::{AppState, is_fleet_channel},
};

#[derive(Serialize)]
pub struct PublishResponse {
    channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sequence: Option<u64>,
}

impl IntoResponse for PublishResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub async fn post_fleet_handler(
    State(state): State<Arc<AppState>>,
    Json(records): Json<Vec<Value>>,
) -> Result<PublishResponse, ApiError> {
    let count = records.len();
    let sequence = state.publish_fleet(records)?;

    info!(sequence, records = count, "Published fleet snapshot");

    Ok(PublishResponse {
        channel: String::from("fleet"),
        sequence: Some(sequence),
    })
}

pub async fn post_frame_handler(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(data): Json<Value>,
) -> Result<PublishResponse, ApiError> {
    if is_fleet_channel(&name) {
        let Value::Array(records) = data else {
            return Err(ApiError::BadRequest(String::from(
                "fleet frames carry a list of records",
            )));
        };

        return post_fleet_handler(State(state), Json(records)).await;
    }

    state.publish_frame(&name, data)?;
    info!(channel = %name, "Published frame");

    Ok(PublishResponse {
        channel: name,
        sequence: None,
    })
}

#[derive(Deserialize)]
pub struct ScheduleQuery {
    day: String,
    zone: Option<String>,
}

pub async fn get_truck_schedules_handler(
    Query(query): Query<ScheduleQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<JsonScheduleSnapshot>, ApiError> {
    let day = parse_weekday(&query.day)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown day: {}", query.day)))?;
    let zone = query
        .zone
        .as_deref()
        .map(ZoneId::new)
        .filter(|zone| !zone.is_blank());

    Ok(Json(truck_schedules(state.records(), day, zone.as_ref())))
}

/// Records running on `day`, and the subset whose route touches `zone`.
/// Records are returned exactly as they were published.
fn truck_schedules(records: Vec<Value>, day: Weekday, zone: Option<&ZoneId>) -> JsonScheduleSnapshot {
    let mut schedules = Vec::new();
    let mut zone_schedules = Vec::new();

    for value in records {
        let Some(record) = serde_json::from_value::<JsonVehicleRecord>(value.clone())
            .ok()
            .and_then(JsonVehicleRecord::into_record)
        else {
            continue;
        };

        if !record.schedule().runs_on(day) {
            continue;
        }

        let in_zone = zone.is_some_and(|zone| {
            record
                .assigned_route()
                .is_some_and(|route| route.touches_zone(zone))
        });

        if in_zone {
            zone_schedules.push(value.clone());
        }
        schedules.push(value);
    }

    JsonScheduleSnapshot {
        schedules,
        zone_schedules,
    }
}
