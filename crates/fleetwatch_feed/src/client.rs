use std::time::Duration;

use fleetwatch_core::vehicle::snapshot::FleetSnapshot;
use futures::{Stream, StreamExt};
use jiff::Timestamp;
use thiserror::Error;
use tokio::{
    net::TcpStream,
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, info, warn};

use crate::frame::{FeedMessage, decode_frame};

pub const DEFAULT_FEED_BUFFER: usize = 64;

type FeedStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to connect to fleet feed {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// The subscription ends when the connection drops.
    #[default]
    Never,
    /// Open a fresh connection after `delay`, for as long as the subscription lives.
    Fresh { delay: Duration },
}

#[derive(Debug, Clone)]
pub struct LiveFeedParams {
    pub url: String,
    pub reconnect: ReconnectPolicy,
    pub buffer: usize,
}

impl LiveFeedParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: ReconnectPolicy::Never,
            buffer: DEFAULT_FEED_BUFFER,
        }
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Snapshot(FleetSnapshot),
    /// A fresh connection replaced a lost one. Frames pushed in between are gone.
    Reconnected,
    Disconnected { reason: String },
}

pub struct LiveFeedClient {
    params: LiveFeedParams,
}

impl LiveFeedClient {
    pub fn new(params: LiveFeedParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LiveFeedParams {
        &self.params
    }

    /// Opens the connection. The returned subscription owns it: closing or
    /// dropping the subscription closes the connection.
    pub async fn subscribe(&self) -> Result<FeedSubscription, FeedError> {
        let stream = connect(&self.params.url).await?;
        info!(url = %self.params.url, "Connected to fleet feed");

        let (events_tx, events_rx) = mpsc::channel(self.params.buffer.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_feed(
            self.params.clone(),
            stream,
            events_tx,
            shutdown_rx,
        ));

        Ok(FeedSubscription {
            events: events_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

/// Scoped handle on a live feed. Events arrive in delivery order.
pub struct FeedSubscription {
    events: mpsc::Receiver<FeedEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FeedSubscription {
    /// Feeds raw text frames through the same decoding path as a live
    /// connection. The subscription ends when `frames` is exhausted.
    pub fn from_frames<S>(frames: S) -> Self
    where
        S: Stream<Item = String> + Send + 'static,
    {
        let (events_tx, events_rx) = mpsc::channel(DEFAULT_FEED_BUFFER);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut frames = std::pin::pin!(frames);
            loop {
                let text = tokio::select! {
                    _ = &mut shutdown_rx => return,
                    text = frames.next() => text,
                };

                let Some(text) = text else {
                    debug!("Frame source exhausted");
                    return;
                };

                if !forward_frame(&text, &events_tx).await {
                    return;
                }
            }
        });

        Self {
            events: events_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// `None` once the feed has ended for good.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        self.events.recv().await
    }

    /// Closes the connection and waits for the feed task to finish.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.events.close();

        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    warn!(error = %err, "Fleet feed task failed");
                }
            }
        }
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

enum ConnectionEnd {
    Lost(String),
    Unsubscribed,
}

async fn connect(url: &str) -> Result<FeedStream, FeedError> {
    let (stream, _) = connect_async(url).await.map_err(|source| FeedError::Connect {
        url: url.to_owned(),
        source,
    })?;

    Ok(stream)
}

async fn run_feed(
    params: LiveFeedParams,
    mut stream: FeedStream,
    events: mpsc::Sender<FeedEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        let reason = match pump_frames(&mut stream, &events, &mut shutdown).await {
            ConnectionEnd::Unsubscribed => return,
            ConnectionEnd::Lost(reason) => reason,
        };

        warn!(url = %params.url, %reason, "Fleet feed connection lost");
        if events
            .send(FeedEvent::Disconnected {
                reason: reason.clone(),
            })
            .await
            .is_err()
        {
            return;
        }

        let ReconnectPolicy::Fresh { delay } = params.reconnect else {
            return;
        };

        stream = loop {
            tokio::select! {
                _ = &mut shutdown => return,
                _ = tokio::time::sleep(delay) => {}
            }

            if events.is_closed() {
                return;
            }

            match connect(&params.url).await {
                Ok(stream) => break stream,
                Err(err) => warn!(error = %err, "Fleet feed reconnect attempt failed"),
            }
        };

        info!(url = %params.url, "Reconnected to fleet feed");
        if events.send(FeedEvent::Reconnected).await.is_err() {
            return;
        }
    }
}

async fn pump_frames(
    stream: &mut FeedStream,
    events: &mpsc::Sender<FeedEvent>,
    shutdown: &mut oneshot::Receiver<()>,
) -> ConnectionEnd {
    loop {
        let message = tokio::select! {
            _ = &mut *shutdown => {
                if let Err(err) = stream.close(None).await {
                    debug!(error = %err, "Fleet feed close handshake failed");
                }
                return ConnectionEnd::Unsubscribed;
            }
            message = stream.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => {
                if !forward_frame(text.as_str(), events).await {
                    return ConnectionEnd::Unsubscribed;
                }
            }
            Some(Ok(Message::Binary(_))) => debug!("Ignoring binary fleet feed frame"),
            Some(Ok(Message::Close(frame))) => {
                let reason = frame
                    .map(|frame| frame.reason.as_str().to_owned())
                    .filter(|reason| !reason.is_empty())
                    .unwrap_or_else(|| String::from("closed by server"));
                return ConnectionEnd::Lost(reason);
            }
            Some(Ok(_)) => {}
            Some(Err(err)) => return ConnectionEnd::Lost(err.to_string()),
            None => return ConnectionEnd::Lost(String::from("connection ended")),
        }
    }
}

/// Returns `false` once nobody listens anymore.
async fn forward_frame(text: &str, events: &mpsc::Sender<FeedEvent>) -> bool {
    match decode_frame(text, Timestamp::now()) {
        Ok(FeedMessage::Fleet(snapshot)) => {
            debug!(
                vehicles = snapshot.len(),
                sequence = ?snapshot.sequence(),
                "Received fleet frame"
            );
            events.send(FeedEvent::Snapshot(snapshot)).await.is_ok()
        }
        Ok(FeedMessage::Ignored { channel }) => {
            debug!(%channel, "Ignoring frame on unconsumed channel");
            true
        }
        Err(err) => {
            warn!(error = %err, "Dropping malformed fleet feed frame");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::SinkExt;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    use super::*;

    fn fleet_frame(vehicle_id: &str) -> String {
        format!(
            r#"{{"name":"fleet","data":[{{"vehicle_id":"{vehicle_id}","latitude":14.0,"longitude":121.0}}]}}"#
        )
    }

    fn snapshot_ids(event: Option<FeedEvent>) -> Vec<String> {
        match event {
            Some(FeedEvent::Snapshot(snapshot)) => snapshot
                .vehicles()
                .iter()
                .map(|record| record.vehicle_id().to_string())
                .collect(),
            other => panic!("expected a snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_frames_do_not_stall_the_feed() {
        let frames = vec![
            fleet_frame("A"),
            String::from("{not json"),
            String::from(r#"{"name":"complaints","data":[]}"#),
            fleet_frame("B"),
        ];
        let mut subscription = FeedSubscription::from_frames(futures::stream::iter(frames));

        assert_eq!(snapshot_ids(subscription.next().await), vec!["A"]);
        assert_eq!(snapshot_ids(subscription.next().await), vec!["B"]);
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = LiveFeedClient::new(LiveFeedParams::new(format!("ws://{addr}/fleet/ws")));

        assert!(matches!(
            client.subscribe().await,
            Err(FeedError::Connect { .. })
        ));
    }

    #[tokio::test]
    async fn test_disconnect_without_reconnect_ends_subscription() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(tcp).await.unwrap();
            socket.send(Message::text(fleet_frame("A"))).await.unwrap();
            socket.close(None).await.unwrap();
        });

        let client = LiveFeedClient::new(LiveFeedParams::new(format!("ws://{addr}/fleet/ws")));
        let mut subscription = client.subscribe().await.unwrap();

        assert_eq!(snapshot_ids(subscription.next().await), vec!["A"]);
        assert!(matches!(
            subscription.next().await,
            Some(FeedEvent::Disconnected { .. })
        ));
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn test_fresh_reconnect_after_drop() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for vehicle_id in ["A", "B"] {
                let (tcp, _) = listener.accept().await.unwrap();
                let mut socket = accept_async(tcp).await.unwrap();
                socket.send(Message::text(fleet_frame(vehicle_id))).await.unwrap();
                if vehicle_id == "A" {
                    socket.close(None).await.unwrap();
                } else {
                    // Keep the second connection open until the client leaves.
                    while socket.next().await.is_some() {}
                }
            }
        });

        let params = LiveFeedParams::new(format!("ws://{addr}/fleet/ws")).with_reconnect(
            ReconnectPolicy::Fresh {
                delay: Duration::from_millis(20),
            },
        );
        let mut subscription = LiveFeedClient::new(params).subscribe().await.unwrap();

        assert_eq!(snapshot_ids(subscription.next().await), vec!["A"]);
        assert!(matches!(
            subscription.next().await,
            Some(FeedEvent::Disconnected { .. })
        ));
        assert_eq!(subscription.next().await, Some(FeedEvent::Reconnected));
        assert_eq!(snapshot_ids(subscription.next().await), vec!["B"]);

        subscription.close().await;
    }
}
