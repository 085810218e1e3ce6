use fleetwatch_core::{
    json::{JsonFeedFrame, decode_records},
    vehicle::snapshot::FleetSnapshot,
};
use jiff::Timestamp;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Fleet frame payload is not a list of records")]
    UnexpectedPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Fleet(FleetSnapshot),
    Ignored { channel: String },
}

/// Decodes one text frame. The snapshot is stamped with the frame's own
/// capture instant when it carries one, `received_at` otherwise.
pub fn decode_frame(text: &str, received_at: Timestamp) -> Result<FeedMessage, FrameError> {
    let frame: JsonFeedFrame = serde_json::from_str(text)?;

    if !frame.is_fleet() {
        return Ok(FeedMessage::Ignored {
            channel: frame.name,
        });
    }

    let records = match frame.data {
        Value::Array(records) => records,
        _ => return Err(FrameError::UnexpectedPayload),
    };

    let snapshot = FleetSnapshot::new(
        frame.captured_at.unwrap_or(received_at),
        decode_records(records),
    )
    .with_sequence(frame.sequence);

    Ok(FeedMessage::Fleet(snapshot))
}
