use std::time::Duration;

use clap::Args;
use fleetwatch_core::{ids::VehicleId, view::FleetView};
use fleetwatch_feed::{
    client::{LiveFeedClient, ReconnectPolicy},
    session::{FleetSession, ViewCommand},
};
use jiff::{Zoned, civil::Weekday};
use tracing::{info, warn};

use crate::{config::Config, logging_adapter::LoggingAdapter, parsers, scope_args::ScopeArgs};

#[derive(Args)]
pub struct WatchArgs {
    #[command(flatten)]
    scope: ScopeArgs,

    /// Vehicle to select once it shows up
    #[arg(short, long)]
    select: Option<String>,

    /// Open a fresh connection this long after the feed drops (e.g. "2s")
    #[arg(long, value_parser = parsers::parse_duration)]
    reconnect_delay: Option<Duration>,

    /// Skip the initial snapshot fetch
    #[arg(long)]
    no_seed: bool,

    /// Schedule day used for snapshot fetches (default: today)
    #[arg(long, value_parser = parsers::parse_day)]
    day: Option<Weekday>,
}

pub async fn run(args: WatchArgs, config: &Config) -> Result<(), anyhow::Error> {
    let scope = args.scope.scope();
    let day = args.day.unwrap_or_else(|| Zoned::now().weekday());

    let fetcher = if args.no_seed {
        None
    } else {
        Some(config.fetcher()?)
    };

    let reconnect = match args.reconnect_delay {
        Some(delay) => ReconnectPolicy::Fresh { delay },
        None => ReconnectPolicy::Never,
    };
    let client = LiveFeedClient::new(config.feed_params().with_reconnect(reconnect));
    // Subscribed before the seed fetch so frames pushed meanwhile are buffered and applied after it.
    let subscription = client.subscribe().await?;

    info!(url = %config.feed_url, %scope, "Watching fleet, press Ctrl-C to stop");

    let view = FleetView::new(scope, LoggingAdapter::default());
    let (session, commands) = FleetSession::new(view, fetcher, day);

    if let Some(vehicle_id) = args.select {
        commands
            .send(ViewCommand::Select(VehicleId::new(vehicle_id)))
            .await?;
    }

    let summary = session
        .run(subscription, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!(
        frames = summary.frames,
        fetches = summary.fetches,
        fetch_failures = summary.fetch_failures,
        presentation_errors = summary.presentation_errors,
        markers_left = summary.adapter.live_markers(),
        "Fleet session ended"
    );

    Ok(())
}
