use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};
use fleetwatch_core::{
    ids::VehicleId,
    presentation::PresentationAdapter,
    view::FleetView,
};
use fleetwatch_feed::frame::{FeedMessage, decode_frame};
use jiff::Timestamp;
use tracing::{info, warn};

use crate::{logging_adapter::LoggingAdapter, scope_args::ScopeArgs};

#[derive(Args)]
pub struct ReplayArgs {
    /// File with one feed frame per line
    #[arg(short, long)]
    input: PathBuf,

    #[command(flatten)]
    scope: ScopeArgs,

    /// Vehicle to select before the first frame
    #[arg(short, long)]
    select: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub frames: usize,
    pub ignored: usize,
    pub malformed: usize,
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub presentation_errors: usize,
}

pub fn run(args: ReplayArgs) -> Result<(), anyhow::Error> {
    info!("Replaying feed frames from {:?}", args.input);
    let reader = BufReader::new(File::open(&args.input)?);

    let mut view = FleetView::new(args.scope.scope(), LoggingAdapter::default());
    if let Some(vehicle_id) = args.select {
        view.select(VehicleId::new(vehicle_id));
    }

    let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
    let report = replay_frames(&mut view, lines.iter().map(String::as_str));

    let (_, teardown_errors) = view.teardown();

    println!("{}", report_table(&report));
    info!(teardown_errors = teardown_errors.len(), "Replay finished");

    Ok(())
}

/// Applies every frame in order. Blank lines are skipped, malformed ones are
/// reported and skipped.
pub fn replay_frames<'a, A>(
    view: &mut FleetView<A>,
    lines: impl IntoIterator<Item = &'a str>,
) -> ReplayReport
where
    A: PresentationAdapter,
{
    let mut report = ReplayReport::default();

    for (index, line) in lines.into_iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match decode_frame(line, Timestamp::now()) {
            Ok(FeedMessage::Fleet(snapshot)) => {
                let update = view.apply_snapshot(snapshot);
                report.frames += 1;
                report.created += update.created;
                report.updated += update.updated;
                report.removed += update.removed;
                report.presentation_errors += update.errors.len();
            }
            Ok(FeedMessage::Ignored { .. }) => report.ignored += 1,
            Err(err) => {
                warn!(line = index + 1, error = %err, "Skipping malformed frame");
                report.malformed += 1;
            }
        }
    }

    report
}

fn report_table(report: &ReplayReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Frames", "Ignored", "Malformed", "Created", "Updated", "Removed", "Errors"])
        .add_row(vec![
            report.frames,
            report.ignored,
            report.malformed,
            report.created,
            report.updated,
            report.removed,
            report.presentation_errors,
        ]);

    table
}

#[cfg(test)]
mod tests {
    use fleetwatch_core::scope::ViewerScope;

    use super::*;

    #[test]
    fn test_replay_counts_operations() {
        let lines = [
            r#"{"name":"fleet","sequence":1,"data":[{"vehicle_id":"A","latitude":14.0,"longitude":121.0},{"vehicle_id":"B","latitude":14.1,"longitude":121.1}]}"#,
            "",
            r#"{"name":"complaints","data":[]}"#,
            "garbage",
            r#"{"name":"fleet","sequence":2,"data":[{"vehicle_id":"A","latitude":14.2,"longitude":121.0}]}"#,
        ];
        let mut view = FleetView::new(ViewerScope::Unrestricted, LoggingAdapter::default());

        let report = replay_frames(&mut view, lines);

        assert_eq!(
            report,
            ReplayReport {
                frames: 2,
                ignored: 1,
                malformed: 1,
                created: 2,
                updated: 1,
                removed: 1,
                presentation_errors: 0,
            }
        );
        assert_eq!(view.adapter().live_markers(), 1);
    }

    #[test]
    fn test_replay_respects_scope() {
        let lines = [
            r#"{"name":"fleet","data":[{"vehicle_id":"A","latitude":14.0,"longitude":121.0},{"vehicle_id":"B","latitude":14.1,"longitude":121.1}]}"#,
        ];
        let mut view = FleetView::new(
            ViewerScope::from_role("driver", None, Some("b")),
            LoggingAdapter::default(),
        );

        let report = replay_frames(&mut view, lines);

        assert_eq!(report.created, 1);
        assert!(view.markers().contains(&VehicleId::new("B")));
    }
}
