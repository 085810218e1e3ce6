use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};
use fleetwatch_core::vehicle::{record::VehicleRecord, snapshot::FleetSnapshot};
use jiff::{Zoned, civil::Weekday};
use tracing::info;

use crate::{config::Config, parsers, scope_args::ScopeArgs};

#[derive(Args)]
pub struct SnapshotArgs {
    #[command(flatten)]
    scope: ScopeArgs,

    /// Schedule day (default: today)
    #[arg(long, value_parser = parsers::parse_day)]
    day: Option<Weekday>,
}

pub async fn run(args: SnapshotArgs, config: &Config) -> Result<(), anyhow::Error> {
    let scope = args.scope.scope();
    let day = args.day.unwrap_or_else(|| Zoned::now().weekday());

    let fetcher = config.fetcher()?;
    let snapshot = fetcher.fetch_for_scope(day, &scope).await?;

    info!(%scope, vehicles = snapshot.len(), "Fetched fleet snapshot");
    println!("{}", fleet_table(&snapshot));

    Ok(())
}

fn fleet_table(snapshot: &FleetSnapshot) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Vehicle", "Status", "Position", "Heading", "Route", "Zones", "Driver", "Days",
    ]);

    for record in snapshot.vehicles() {
        table.add_row(row(record));
    }

    table
}

fn row(record: &VehicleRecord) -> Vec<String> {
    let position = record
        .position()
        .map(|position| format!("{:.5}, {:.5}", position.lat(), position.lng()))
        .unwrap_or_else(|| String::from("-"));

    let route = record.assigned_route();
    let route_name = route
        .map(|route| route.name().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| String::from("-"));
    let zones = route
        .map(|route| {
            route
                .zones()
                .iter()
                .map(|zone| zone.zone_id().to_string())
                .collect::<Vec<_>>()
                .join(" > ")
        })
        .unwrap_or_default();

    let schedule = record.schedule();

    vec![
        record.vehicle_id().to_string(),
        record.status().to_string(),
        position,
        record.heading().to_string(),
        route_name,
        zones,
        record
            .driver()
            .map(|driver| driver.name().to_owned())
            .unwrap_or_default(),
        schedule.days.join(", "),
    ]
}
