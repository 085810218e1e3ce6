use fxhash::FxHashMap;
use jiff::Timestamp;
use tracing::debug;

use crate::ids::VehicleId;

use super::record::VehicleRecord;

/// Complete fleet state at one instant. Vehicle ids are unique: when a source
/// repeats an id, the last record wins.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetSnapshot {
    captured_at: Timestamp,
    sequence: Option<u64>,
    vehicles: Vec<VehicleRecord>,
}

impl FleetSnapshot {
    pub fn new(captured_at: Timestamp, records: impl IntoIterator<Item = VehicleRecord>) -> Self {
        let mut index: FxHashMap<VehicleId, usize> = FxHashMap::default();
        let mut vehicles: Vec<VehicleRecord> = Vec::new();

        for record in records {
            if record.vehicle_id().is_blank() {
                debug!("Dropping vehicle record without an id");
                continue;
            }

            match index.get(record.vehicle_id()) {
                Some(&position) => {
                    debug!(vehicle_id = %record.vehicle_id(), "Duplicate vehicle id, keeping last record");
                    vehicles[position] = record;
                }
                None => {
                    index.insert(record.vehicle_id().clone(), vehicles.len());
                    vehicles.push(record);
                }
            }
        }

        Self {
            captured_at,
            sequence: None,
            vehicles,
        }
    }

    pub fn empty(captured_at: Timestamp) -> Self {
        Self {
            captured_at,
            sequence: None,
            vehicles: vec![],
        }
    }

    pub fn with_sequence(mut self, sequence: Option<u64>) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }

    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    pub fn vehicles(&self) -> &[VehicleRecord] {
        &self.vehicles
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn get(&self, vehicle_id: &VehicleId) -> Option<&VehicleRecord> {
        self.vehicles
            .iter()
            .find(|record| record.vehicle_id() == vehicle_id)
    }

    pub fn renderable(&self) -> impl Iterator<Item = &VehicleRecord> {
        self.vehicles.iter().filter(|record| record.is_renderable())
    }

    /// Keeps capture metadata; a subset of a deduplicated snapshot stays deduplicated.
    pub(crate) fn retain<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&VehicleRecord) -> bool,
    {
        self.vehicles.retain(predicate);
        self
    }
}
