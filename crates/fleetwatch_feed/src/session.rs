use std::future::Future;

use fleetwatch_core::{
    ids::VehicleId,
    presentation::{PresentationAdapter, PresentationError},
    view::FleetView,
    vehicle::snapshot::FleetSnapshot,
};
use jiff::civil::Weekday;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    client::{FeedEvent, FeedSubscription},
    snapshot::SnapshotFetcher,
};

const COMMAND_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Select(VehicleId),
    ClearSelection,
    /// Re-seed from the snapshot fetcher.
    Refresh,
}

#[derive(Debug)]
pub struct SessionSummary<A> {
    pub frames: usize,
    pub fetches: usize,
    pub fetch_failures: usize,
    pub presentation_errors: usize,
    pub adapter: A,
    pub teardown_errors: Vec<PresentationError>,
}

/// The event loop of one mounted view. Frames, fetches and commands are
/// handled one at a time, so the marker registry is never diffed while a
/// previous batch is still being applied.
pub struct FleetSession<A: PresentationAdapter> {
    view: FleetView<A>,
    fetcher: Option<SnapshotFetcher>,
    day: Weekday,
    commands: mpsc::Receiver<ViewCommand>,
    frames: usize,
    fetches: usize,
    fetch_failures: usize,
    presentation_errors: usize,
}

impl<A: PresentationAdapter> FleetSession<A> {
    pub fn new(
        view: FleetView<A>,
        fetcher: Option<SnapshotFetcher>,
        day: Weekday,
    ) -> (Self, mpsc::Sender<ViewCommand>) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);

        let session = Self {
            view,
            fetcher,
            day,
            commands: commands_rx,
            frames: 0,
            fetches: 0,
            fetch_failures: 0,
            presentation_errors: 0,
        };

        (session, commands_tx)
    }

    pub fn view(&self) -> &FleetView<A> {
        &self.view
    }

    /// Runs until `shutdown` resolves or the feed ends, then closes the feed
    /// and removes everything the view has drawn.
    pub async fn run<F>(
        mut self,
        mut subscription: FeedSubscription,
        shutdown: F,
    ) -> SessionSummary<A>
    where
        F: Future<Output = ()>,
    {
        info!(scope = %self.view.scope(), "Starting fleet session");
        self.refresh().await;

        let mut shutdown = std::pin::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Fleet session shutting down");
                    break;
                }
                Some(command) = self.commands.recv() => self.handle_command(command).await,
                event = subscription.next() => match event {
                    Some(FeedEvent::Snapshot(snapshot)) => {
                        self.frames += 1;
                        self.apply(snapshot);
                    }
                    Some(FeedEvent::Reconnected) => {
                        info!("Fleet feed reconnected, refetching snapshot");
                        self.refresh().await;
                    }
                    Some(FeedEvent::Disconnected { reason }) => {
                        warn!(%reason, "Fleet feed lost, keeping the last rendered state");
                    }
                    None => {
                        info!("Fleet feed ended");
                        break;
                    }
                },
            }
        }

        subscription.close().await;

        let (adapter, teardown_errors) = self.view.teardown();
        if !teardown_errors.is_empty() {
            warn!(errors = teardown_errors.len(), "Fleet view teardown had failures");
        }

        SessionSummary {
            frames: self.frames,
            fetches: self.fetches,
            fetch_failures: self.fetch_failures,
            presentation_errors: self.presentation_errors,
            adapter,
            teardown_errors,
        }
    }

    async fn handle_command(&mut self, command: ViewCommand) {
        debug!(?command, "Handling view command");

        let update = match command {
            ViewCommand::Select(vehicle_id) => self.view.select(vehicle_id),
            ViewCommand::ClearSelection => self.view.clear_selection(),
            ViewCommand::Refresh => {
                self.refresh().await;
                return;
            }
        };

        self.presentation_errors += update.errors.len();
    }

    /// A failed fetch leaves whatever is rendered in place.
    async fn refresh(&mut self) {
        let Some(fetcher) = &self.fetcher else {
            return;
        };

        let fetched = fetcher.fetch_for_scope(self.day, self.view.scope()).await;
        match fetched {
            Ok(snapshot) => {
                self.fetches += 1;
                self.apply(snapshot);
            }
            Err(err) => {
                self.fetch_failures += 1;
                warn!(error = %err, "Fleet snapshot fetch failed");
            }
        }
    }

    fn apply(&mut self, snapshot: FleetSnapshot) {
        let update = self.view.apply_snapshot(snapshot);
        self.presentation_errors += update.errors.len();
    }
}

#[cfg(test)]
mod tests {
    use fleetwatch_core::{
        scope::ViewerScope,
        test_utils::{AdapterCall, RecordingAdapter},
    };

    use super::*;

    fn frame(records: &[(&str, f64)]) -> String {
        let records = records
            .iter()
            .map(|(vehicle_id, lat)| {
                format!(
                    r#"{{"vehicle_id":"{vehicle_id}","latitude":{lat},"longitude":121.0,"route":{{"points":[[{lat},121.0],[14.5,121.1]],"zones":[{{"zone_id":"Z1"}}]}}}}"#
                )
            })
            .collect::<Vec<_>>()
            .join(",");

        format!(r#"{{"name":"fleet","data":[{records}]}}"#)
    }

    fn session(scope: ViewerScope) -> (FleetSession<RecordingAdapter>, mpsc::Sender<ViewCommand>) {
        let view = FleetView::new(scope, RecordingAdapter::default());
        FleetSession::new(view, None, Weekday::Monday)
    }

    fn count(calls: &[AdapterCall], predicate: impl Fn(&AdapterCall) -> bool) -> usize {
        calls.iter().filter(|call| predicate(call)).count()
    }

    #[tokio::test]
    async fn test_malformed_frame_leaves_markers_unchanged() {
        let (session, _commands) = session(ViewerScope::Unrestricted);
        let frames = vec![
            frame(&[("A", 14.0), ("B", 14.1)]),
            String::from("<html>502 Bad Gateway</html>"),
            frame(&[("A", 14.0), ("B", 14.1)]),
        ];

        let summary = session
            .run(
                FeedSubscription::from_frames(futures::stream::iter(frames)),
                std::future::pending(),
            )
            .await;

        let calls = summary.adapter.calls();
        assert_eq!(summary.frames, 2);
        assert_eq!(count(calls, |call| matches!(call, AdapterCall::CreateMarker { .. })), 2);
        assert_eq!(count(calls, |call| matches!(call, AdapterCall::UpdateMarker { .. })), 0);
        // Teardown releases both markers.
        assert_eq!(count(calls, |call| matches!(call, AdapterCall::RemoveMarker { .. })), 2);
        assert_eq!(summary.adapter.live_markers(), 0);
        assert!(summary.teardown_errors.is_empty());
    }

    #[tokio::test]
    async fn test_selection_draws_and_releases_route() {
        let (session, commands) = session(ViewerScope::Unrestricted);
        commands
            .send(ViewCommand::Select(VehicleId::new("B")))
            .await
            .unwrap();

        let frames = vec![frame(&[("A", 14.0), ("B", 14.1)]), frame(&[("A", 14.0)])];
        let summary = session
            .run(
                FeedSubscription::from_frames(futures::stream::iter(frames)),
                std::future::pending(),
            )
            .await;

        let calls = summary.adapter.calls();
        // Drawn once when B first appears, kept while B is missing, removed on teardown.
        assert_eq!(count(calls, |call| matches!(call, AdapterCall::DrawRoute { .. })), 1);
        assert_eq!(count(calls, |call| matches!(call, AdapterCall::RemoveRoute { .. })), 1);
        assert_eq!(summary.adapter.live_routes(), 0);
        assert_eq!(summary.adapter.live_markers(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_tears_down_view() {
        let (session, _commands) = session(ViewerScope::from_role("official", Some("Z1"), None));
        let (frames_tx, frames_rx) = futures::channel::mpsc::unbounded::<String>();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        frames_tx.unbounded_send(frame(&[("A", 14.0)])).unwrap();

        let handle = tokio::spawn(async move {
            session
                .run(FeedSubscription::from_frames(frames_rx), async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();
        let summary = handle.await.unwrap();

        assert_eq!(summary.frames, 1);
        assert_eq!(summary.adapter.live_markers(), 0);
        drop(frames_tx);
    }
}
