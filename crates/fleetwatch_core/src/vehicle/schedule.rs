use jiff::civil::Weekday;

use crate::ids::DriverId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Driver {
    id: Option<DriverId>,
    name: String,
    contact: Option<String>,
}

impl Driver {
    pub fn new(id: Option<DriverId>, name: impl Into<String>, contact: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            contact,
        }
    }

    pub fn id(&self) -> Option<&DriverId> {
        self.id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> Option<&str> {
        self.contact.as_deref()
    }
}

/// The collection schedule a vehicle is currently running.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScheduleContext {
    pub garbage_type: Option<String>,
    pub days: Vec<String>,
    pub remark: Option<String>,
    pub status: Option<String>,
}

impl ScheduleContext {
    /// A schedule without days is treated as running every day.
    pub fn runs_on(&self, day: Weekday) -> bool {
        self.days.is_empty()
            || self
                .days
                .iter()
                .any(|name| parse_weekday(name) == Some(day))
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
        Weekday::Sunday => "Sunday",
    }
}

/// Accepts full names and three letter abbreviations, case-insensitive.
pub fn parse_weekday(input: &str) -> Option<Weekday> {
    let normalized = input.trim().to_ascii_lowercase();
    let prefix = normalized.get(..3)?;

    let day = match prefix {
        "mon" => Weekday::Monday,
        "tue" => Weekday::Tuesday,
        "wed" => Weekday::Wednesday,
        "thu" => Weekday::Thursday,
        "fri" => Weekday::Friday,
        "sat" => Weekday::Saturday,
        "sun" => Weekday::Sunday,
        _ => return None,
    };

    if weekday_name(day)
        .to_ascii_lowercase()
        .starts_with(normalized.as_str())
    {
        Some(day)
    } else {
        None
    }
}
