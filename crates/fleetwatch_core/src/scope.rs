use std::fmt::Display;

use tracing::warn;

use crate::{
    ids::{VehicleId, ZoneId},
    vehicle::{record::VehicleRecord, snapshot::FleetSnapshot},
};

/// The part of the fleet a viewer is allowed to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerScope {
    /// Administrative viewers see every vehicle.
    Unrestricted,
    /// Zone officials see vehicles whose assigned route touches their zone.
    ZoneOfficial { zone: ZoneId },
    /// Vehicle operators see only their own vehicle.
    Operator { vehicle_id: VehicleId },
    /// Unknown roles and incomplete assignments see nothing.
    Denied,
}

impl ViewerScope {
    pub fn from_role(role: &str, zone: Option<&str>, vehicle_id: Option<&str>) -> Self {
        let normalized = role.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let zone = zone.map(ZoneId::new).filter(|zone| !zone.is_blank());
        let vehicle_id = vehicle_id
            .map(VehicleId::new)
            .filter(|vehicle_id| !vehicle_id.is_blank());

        match normalized.as_str() {
            "admin" | "administrator" | "super_admin" | "superadmin" | "unrestricted" => {
                ViewerScope::Unrestricted
            }
            "official" | "barangay_official" | "zone_official" => match zone {
                Some(zone) => ViewerScope::ZoneOfficial { zone },
                None => {
                    warn!(role, "Zone official without an assigned zone, denying fleet access");
                    ViewerScope::Denied
                }
            },
            "driver" | "operator" | "truck_driver" | "vehicle_operator" => match vehicle_id {
                Some(vehicle_id) => ViewerScope::Operator { vehicle_id },
                None => {
                    warn!(role, "Operator without an assigned vehicle, denying fleet access");
                    ViewerScope::Denied
                }
            },
            _ => {
                warn!(role, "Unknown viewer role, denying fleet access");
                ViewerScope::Denied
            }
        }
    }

    pub fn zone(&self) -> Option<&ZoneId> {
        match self {
            ViewerScope::ZoneOfficial { zone } => Some(zone),
            _ => None,
        }
    }

    pub fn is_visible(&self, record: &VehicleRecord) -> bool {
        match self {
            ViewerScope::Unrestricted => true,
            ViewerScope::ZoneOfficial { zone } => record
                .assigned_route()
                .is_some_and(|route| route.touches_zone(zone)),
            ViewerScope::Operator { vehicle_id } => record.vehicle_id().matches(vehicle_id),
            ViewerScope::Denied => false,
        }
    }

    pub fn filter(&self, snapshot: FleetSnapshot) -> FleetSnapshot {
        match self {
            ViewerScope::Unrestricted => snapshot,
            _ => snapshot.retain(|record| self.is_visible(record)),
        }
    }
}

impl Display for ViewerScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewerScope::Unrestricted => write!(f, "unrestricted"),
            ViewerScope::ZoneOfficial { zone } => write!(f, "zone-official({})", zone),
            ViewerScope::Operator { vehicle_id } => write!(f, "operator({})", vehicle_id),
            ViewerScope::Denied => write!(f, "denied"),
        }
    }
}

pub fn filter(snapshot: FleetSnapshot, scope: &ViewerScope) -> FleetSnapshot {
    scope.filter(snapshot)
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use crate::test_utils;

    use super::*;

    fn ids(snapshot: &FleetSnapshot) -> Vec<&str> {
        snapshot
            .vehicles()
            .iter()
            .map(|record| record.vehicle_id().as_str())
            .collect()
    }

    fn mixed_snapshot() -> FleetSnapshot {
        test_utils::snapshot(vec![
            test_utils::routed_record("V1", 14.0, 121.0, &["Z1", "Z2"]),
            test_utils::routed_record("V2", 14.1, 121.1, &["Z3"]),
            test_utils::record("42", 14.2, 121.2),
        ])
    }

    #[test]
    fn test_unrestricted_is_identity() {
        let snapshot = mixed_snapshot();
        assert_eq!(filter(snapshot.clone(), &ViewerScope::Unrestricted), snapshot);
    }

    #[test]
    fn test_zone_official_sees_routes_touching_zone() {
        let scope = ViewerScope::ZoneOfficial {
            zone: ZoneId::new("Z1"),
        };

        let filtered = filter(mixed_snapshot(), &scope);
        assert_eq!(ids(&filtered), vec!["V1"]);
    }

    #[test]
    fn test_operator_sees_only_own_vehicle() {
        let scope = ViewerScope::from_role("driver", None, Some(" 42 "));
        let filtered = filter(mixed_snapshot(), &scope);
        assert_eq!(ids(&filtered), vec!["42"]);

        let scope = ViewerScope::from_role("driver", None, Some("v2"));
        let filtered = filter(mixed_snapshot(), &scope);
        assert_eq!(ids(&filtered), vec!["V2"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let scopes = vec![
            ViewerScope::Unrestricted,
            ViewerScope::ZoneOfficial {
                zone: ZoneId::new("Z2"),
            },
            ViewerScope::Operator {
                vehicle_id: VehicleId::new("V2"),
            },
            ViewerScope::Denied,
        ];

        for scope in scopes {
            let once = filter(mixed_snapshot(), &scope);
            let twice = filter(once.clone(), &scope);
            assert_eq!(once, twice, "scope {scope}");
        }
    }

    #[test]
    fn test_unknown_role_is_most_restrictive() {
        let scope = ViewerScope::from_role("janitor", Some("Z1"), Some("V1"));
        assert_eq!(scope, ViewerScope::Denied);
        assert!(filter(mixed_snapshot(), &scope).is_empty());
    }

    #[test]
    fn test_missing_assignment_is_denied() {
        assert_eq!(
            ViewerScope::from_role("barangay_official", None, None),
            ViewerScope::Denied
        );
        assert_eq!(
            ViewerScope::from_role("truck-driver", None, Some("  ")),
            ViewerScope::Denied
        );
        assert_eq!(
            ViewerScope::from_role("Super Admin", None, None),
            ViewerScope::Unrestricted
        );
    }

    #[test]
    fn test_empty_result_keeps_capture_metadata() {
        let snapshot = FleetSnapshot::empty(Timestamp::UNIX_EPOCH).with_sequence(Some(7));
        let filtered = filter(snapshot, &ViewerScope::Denied);

        assert!(filtered.is_empty());
        assert_eq!(filtered.sequence(), Some(7));
    }
}
