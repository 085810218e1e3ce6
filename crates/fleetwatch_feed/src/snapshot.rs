use std::time::Duration;

use fleetwatch_core::{
    ids::ZoneId,
    json::{JsonScheduleSnapshot, decode_records},
    scope::ViewerScope,
    vehicle::{schedule::weekday_name, snapshot::FleetSnapshot},
};
use jiff::{Timestamp, civil::Weekday};
use thiserror::Error;
use tracing::debug;

pub const TRUCK_SCHEDULES_PATH: &str = "/schedules/truck";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SnapshotFetcherParams {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl SnapshotFetcherParams {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// The two lists of the schedule endpoint, decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSnapshot {
    pub all: FleetSnapshot,
    pub zone: FleetSnapshot,
}

impl ScheduleSnapshot {
    /// Zone officials start from the backend's zone list, everyone else from
    /// the full list. The scope filter runs either way.
    pub fn for_scope(self, scope: &ViewerScope) -> FleetSnapshot {
        let source = match scope {
            ViewerScope::ZoneOfficial { .. } => self.zone,
            _ => self.all,
        };

        scope.filter(source)
    }
}

pub struct SnapshotFetcher {
    params: SnapshotFetcherParams,
    client: reqwest::Client,
}

impl SnapshotFetcher {
    pub fn new(params: SnapshotFetcherParams) -> Result<Self, SnapshotError> {
        let client = reqwest::Client::builder().timeout(params.timeout).build()?;

        Ok(Self { params, client })
    }

    pub fn params(&self) -> &SnapshotFetcherParams {
        &self.params
    }

    pub async fn fetch(
        &self,
        day: Weekday,
        zone: Option<&ZoneId>,
    ) -> Result<ScheduleSnapshot, SnapshotError> {
        let url = format!(
            "{}{}",
            self.params.base_url.trim_end_matches('/'),
            TRUCK_SCHEDULES_PATH
        );

        let mut query = vec![("day", weekday_name(day))];
        if let Some(zone) = zone {
            query.push(("zone", zone.as_str()));
        }

        let mut request = self.client.get(url).query(&query);
        if let Some(token) = &self.params.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let captured_at = Timestamp::now();

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SnapshotError::Api { status, message });
        }

        let body = response.text().await?;
        let schedules: JsonScheduleSnapshot = serde_json::from_str(&body)?;

        debug!(
            day = weekday_name(day),
            zone = ?zone.map(ZoneId::as_str),
            schedules = schedules.schedules.len(),
            zone_schedules = schedules.zone_schedules.len(),
            "Fetched fleet snapshot"
        );

        Ok(ScheduleSnapshot {
            all: FleetSnapshot::new(captured_at, decode_records(schedules.schedules)),
            zone: FleetSnapshot::new(captured_at, decode_records(schedules.zone_schedules)),
        })
    }

    pub async fn fetch_for_scope(
        &self,
        day: Weekday,
        scope: &ViewerScope,
    ) -> Result<FleetSnapshot, SnapshotError> {
        let snapshot = self.fetch(day, scope.zone()).await?;
        Ok(snapshot.for_scope(scope))
    }
}
