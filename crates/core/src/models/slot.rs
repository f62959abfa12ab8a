use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::SlotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub Uuid);

impl SlotId {
    pub fn new() -> Self {
        SlotId(Uuid::new_v4())
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for SlotId {
    fn from(id: Uuid) -> Self {
        SlotId(id)
    }
}

/// Human-facing time-of-day format used on the wire, e.g. `09:00 AM`.
///
/// Parsing also accepts 24-hour `HH:MM`, which is what browser time inputs
/// submit.
pub mod clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const DISPLAY_FORMAT: &str = "%I:%M %p";
    const INPUT_FORMAT: &str = "%H:%M";

    pub fn format(time: NaiveTime) -> String {
        time.format(DISPLAY_FORMAT).to_string()
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, DISPLAY_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(raw, INPUT_FORMAT))
    }

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(|e| serde::de::Error::custom(format!("invalid time '{raw}': {e}")))
    }
}

/// Channel through which a slot got booked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BookingSource {
    InPerson,
    WhatsApp,
    Other(String),
    /// Set only by the customer self-service booking path.
    OnlineBooking,
}

impl BookingSource {
    pub fn other(text: &str) -> Result<Self, SlotError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SlotError::Validation(
                "An 'other' booking source needs a description".to_string(),
            ));
        }
        Ok(BookingSource::Other(text.to_string()))
    }
}

impl fmt::Display for BookingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingSource::InPerson => f.write_str("in-person"),
            BookingSource::WhatsApp => f.write_str("whatsapp"),
            BookingSource::Other(text) => write!(f, "Other: {text}"),
            BookingSource::OnlineBooking => f.write_str("online-booking"),
        }
    }
}

impl FromStr for BookingSource {
    type Err = SlotError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "in-person" => Ok(BookingSource::InPerson),
            "whatsapp" => Ok(BookingSource::WhatsApp),
            "online-booking" => Ok(BookingSource::OnlineBooking),
            lowered if lowered.starts_with("other:") => {
                BookingSource::other(&trimmed["other:".len()..])
            }
            _ => Err(SlotError::Validation(format!(
                "Unknown booking source '{trimmed}'"
            ))),
        }
    }
}

impl TryFrom<String> for BookingSource {
    type Error = SlotError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<BookingSource> for String {
    fn from(source: BookingSource) -> Self {
        source.to_string()
    }
}

/// Status of a slot. The booking source only exists on `Booked`, so leaving
/// the booked state always drops it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Busy,
    Booked { source: BookingSource },
}

impl SlotStatus {
    pub fn kind(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Busy => "busy",
            SlotStatus::Booked { .. } => "booked",
        }
    }

    pub fn source(&self) -> Option<&BookingSource> {
        match self {
            SlotStatus::Booked { source } => Some(source),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SlotStatus::Available)
    }

    /// Rebuilds a status from its stored columns.
    pub fn from_parts(kind: &str, source: Option<&str>) -> Result<Self, SlotError> {
        match (kind, source) {
            ("available", _) => Ok(SlotStatus::Available),
            ("busy", _) => Ok(SlotStatus::Busy),
            ("booked", Some(source)) => Ok(SlotStatus::Booked {
                source: source.parse()?,
            }),
            ("booked", None) => Err(SlotError::Validation(
                "Booked slot is missing its booking source".to_string(),
            )),
            (other, _) => Err(SlotError::Validation(format!("Unknown slot status '{other}'"))),
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    #[serde(with = "clock")]
    pub start: NaiveTime,
    #[serde(with = "clock")]
    pub end: NaiveTime,
    #[serde(flatten)]
    pub status: SlotStatus,
}

impl Slot {
    pub fn available(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            id: SlotId::new(),
            start,
            end,
            status: SlotStatus::Available,
        }
    }

    /// The label customers pick from, e.g. `09:00 AM - 10:00 AM`.
    pub fn label(&self) -> String {
        format!("{} - {}", clock::format(self.start), clock::format(self.end))
    }
}
