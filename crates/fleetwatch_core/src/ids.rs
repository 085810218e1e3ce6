use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifiers arrive as strings or numbers depending on the source, so every
/// id is stored in its trimmed string form.
macro_rules! define_id_newtype {
    ($name:ident) => {
        #[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(id.as_ref().trim().to_owned())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.is_empty()
            }

            /// Case-insensitive comparison of the normalized string forms.
            pub fn matches(&self, other: &$name) -> bool {
                self.0.eq_ignore_ascii_case(&other.0)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self::new(id)
            }
        }

        impl From<&String> for $name {
            fn from(id: &String) -> Self {
                Self::new(id)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                RawId::deserialize(deserializer).map(|raw| Self::new(raw.into_string()))
            }
        }
    };
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(text) => text,
            RawId::Unsigned(value) => value.to_string(),
            RawId::Signed(value) => value.to_string(),
            RawId::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                (value as i64).to_string()
            }
            RawId::Float(value) => value.to_string(),
        }
    }
}

define_id_newtype!(VehicleId);
define_id_newtype!(ZoneId);
define_id_newtype!(DriverId);
