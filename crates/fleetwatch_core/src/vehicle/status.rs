use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VehicleStatus {
    OnRoute,
    Active,
    UnderMaintenance,
    Unavailable,
    Complete,
    #[default]
    Unknown,
}

impl VehicleStatus {
    /// Maps the free-text status used by the backend. Anything unrecognized is
    /// `Unknown` rather than an error.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw
            .trim()
            .to_ascii_lowercase()
            .replace(['_', ' '], "-");

        match normalized.as_str() {
            "on-route" | "onroute" | "en-route" | "in-transit" => VehicleStatus::OnRoute,
            "active" | "available" => VehicleStatus::Active,
            "maintenance" | "under-maintenance" | "in-maintenance" => {
                VehicleStatus::UnderMaintenance
            }
            "unavailable" | "inactive" => VehicleStatus::Unavailable,
            "complete" | "completed" | "done" => VehicleStatus::Complete,
            _ => VehicleStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::OnRoute => "on-route",
            VehicleStatus::Active => "active",
            VehicleStatus::UnderMaintenance => "under-maintenance",
            VehicleStatus::Unavailable => "unavailable",
            VehicleStatus::Complete => "complete",
            VehicleStatus::Unknown => "unknown",
        }
    }
}

impl From<&str> for VehicleStatus {
    fn from(raw: &str) -> Self {
        VehicleStatus::parse(raw)
    }
}

impl Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
