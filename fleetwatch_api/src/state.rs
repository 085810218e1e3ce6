use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use fleetwatch_core::json::{FLEET_CHANNEL, JsonFeedFrame};
use jiff::Timestamp;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

pub const FRAME_BUFFER: usize = 256;

/// Latest published fleet plus the fan-out of every frame to websocket
/// subscribers.
pub struct AppState {
    records: RwLock<Vec<Value>>,
    latest_frame: RwLock<Option<Arc<str>>>,
    sequence: AtomicU64,
    frames: broadcast::Sender<Arc<str>>,
}

impl Default for AppState {
    fn default() -> Self {
        let (frames, _) = broadcast::channel(FRAME_BUFFER);

        Self {
            records: RwLock::new(Vec::new()),
            latest_frame: RwLock::new(None),
            sequence: AtomicU64::new(0),
            frames,
        }
    }
}

impl AppState {
    /// Stores `records` as the current fleet and broadcasts them as a `fleet`
    /// frame. Returns the frame's sequence number.
    pub fn publish_fleet(&self, records: Vec<Value>) -> Result<u64, serde_json::Error> {
        let mut latest_frame = self.latest_frame.write();

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let frame = JsonFeedFrame::fleet(records.clone(), Some(sequence), Some(Timestamp::now()));
        let text: Arc<str> = serde_json::to_string(&frame)?.into();

        *self.records.write() = records;
        *latest_frame = Some(text.clone());
        self.broadcast(text);

        Ok(sequence)
    }

    /// Broadcasts a frame on any channel other than `fleet`. Nothing is stored.
    pub fn publish_frame(&self, name: &str, data: Value) -> Result<(), serde_json::Error> {
        let frame = JsonFeedFrame {
            name: name.to_owned(),
            data,
            sequence: None,
            captured_at: None,
        };
        let text: Arc<str> = serde_json::to_string(&frame)?.into();

        self.broadcast(text);

        Ok(())
    }

    /// The latest fleet frame and a receiver for everything published after it.
    pub fn subscribe(&self) -> (Option<Arc<str>>, broadcast::Receiver<Arc<str>>) {
        let latest_frame = self.latest_frame.read();
        (latest_frame.clone(), self.frames.subscribe())
    }

    pub fn records(&self) -> Vec<Value> {
        self.records.read().clone()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn broadcast(&self, text: Arc<str>) {
        // No subscribers is fine.
        if let Ok(receivers) = self.frames.send(text) {
            debug!(receivers, "Broadcast frame");
        }
    }
}

pub fn is_fleet_channel(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(FLEET_CHANNEL)
}
