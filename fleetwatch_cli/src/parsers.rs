use std::time::Duration;

use fleetwatch_core::vehicle::schedule::parse_weekday;
use jiff::{SpanRelativeTo, civil::Weekday};

pub fn parse_duration(input: &str) -> Result<Duration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration.unsigned_abs());
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration.unsigned_abs());
    }

    if let Ok(seconds) = input.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }

    Err(String::from("Invalid duration"))
}

pub fn parse_day(input: &str) -> Result<Weekday, String> {
    parse_weekday(input).ok_or_else(|| format!("Invalid day: {input}"))
}
