use std::{convert::Infallible, hint::black_box};

use criterion::{Criterion, criterion_group, criterion_main};
use fleetwatch_core::{
    ids::VehicleId,
    presentation::{MarkerUpdate, PresentationAdapter},
    reconcile::{MarkerRegistry, apply_plan, reconcile},
    scope::ViewerScope,
    vehicle::{
        heading::Heading,
        position::Position,
        record::{VehicleRecord, VehicleRecordBuilder},
        route::{AssignedRoute, RouteZone},
        snapshot::FleetSnapshot,
        status::VehicleStatus,
    },
};
use jiff::Timestamp;

const FLEET_SIZE: usize = 2_000;

#[derive(Default)]
struct NullAdapter {
    next_handle: u64,
}

impl PresentationAdapter for NullAdapter {
    type MarkerHandle = u64;
    type RouteHandle = u64;
    type Error = Infallible;

    fn create_marker(
        &mut self,
        _vehicle_id: &VehicleId,
        _position: Position,
        _heading: Heading,
        _status: VehicleStatus,
    ) -> Result<u64, Infallible> {
        self.next_handle += 1;
        Ok(self.next_handle)
    }

    fn update_marker(&mut self, _handle: &u64, _update: &MarkerUpdate) -> Result<(), Infallible> {
        Ok(())
    }

    fn remove_marker(&mut self, _handle: u64) -> Result<(), Infallible> {
        Ok(())
    }

    fn draw_route(&mut self, _points: &[Position], _color: &str) -> Result<u64, Infallible> {
        self.next_handle += 1;
        Ok(self.next_handle)
    }

    fn remove_route(&mut self, _handle: u64) -> Result<(), Infallible> {
        Ok(())
    }
}

fn fleet(size: usize, offset: f64) -> FleetSnapshot {
    let records = (0..size).map(|index| vehicle(index, offset));
    FleetSnapshot::new(Timestamp::UNIX_EPOCH, records.collect::<Vec<VehicleRecord>>())
}

fn vehicle(index: usize, offset: f64) -> VehicleRecord {
    let lat = 14.0 + (index % 100) as f64 * 0.001 + offset;
    let lng = 121.0 + (index / 100) as f64 * 0.001;
    let zone = format!("Z{}", index % 25);

    let route = AssignedRoute::new(
        format!("Route {index}"),
        Position::from_lat_lng(lat, lng).into_iter().collect(),
        None,
        vec![RouteZone::new(zone, 0)],
    );

    VehicleRecordBuilder::new(index as u64)
        .with_lat_lng(lat, lng)
        .with_heading((index * 7) as f64)
        .with_status(VehicleStatus::OnRoute)
        .with_assigned_route(route)
        .build()
}

fn reconcile_benchmark(c: &mut Criterion) {
    let initial = fleet(FLEET_SIZE, 0.0);
    let moved = fleet(FLEET_SIZE, 0.0005);
    let shrunk = fleet(FLEET_SIZE / 2, 0.0);

    let mut adapter = NullAdapter::default();
    let seeded = reconcile(&MarkerRegistry::new(), &initial);
    let registry = apply_plan(MarkerRegistry::new(), &seeded, &mut adapter).registry;

    c.bench_function("reconcile initial fleet", |b| {
        let empty = MarkerRegistry::<u64>::new();
        b.iter(|| reconcile(black_box(&empty), black_box(&initial)))
    });

    c.bench_function("reconcile unchanged fleet", |b| {
        b.iter(|| reconcile(black_box(&registry), black_box(&initial)))
    });

    c.bench_function("reconcile moved fleet", |b| {
        b.iter(|| reconcile(black_box(&registry), black_box(&moved)))
    });

    c.bench_function("reconcile half fleet removed", |b| {
        b.iter(|| reconcile(black_box(&registry), black_box(&shrunk)))
    });
}

fn scope_benchmark(c: &mut Criterion) {
    let snapshot = fleet(FLEET_SIZE, 0.0);
    let zone_scope = ViewerScope::from_role("barangay_official", Some("Z7"), None);

    c.bench_function("filter zone official scope", |b| {
        b.iter(|| zone_scope.filter(black_box(snapshot.clone())))
    });
}

criterion_group!(benches, reconcile_benchmark, scope_benchmark);
criterion_main!(benches);
