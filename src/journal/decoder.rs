//! Decoder for game journal lines.
//!
//! Each journal line is a self-contained JSON object tagged by its `event`
//! field. Only system arrival events carry faction influence, so everything
//! else decodes to `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::DecodeError;

/// Display format for event timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder for labels the journal leaves out.
pub const UNKNOWN: &str = "Unknown";

/// A JSON field that distinguishes "absent" from an explicit `null`.
///
/// Use with `#[serde(default)]` so a missing key becomes [`Field::Absent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    /// Key not present in the object.
    Absent,
    /// Key present with value `null`.
    Null,
    /// Key present with a value.
    Present(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Present(value),
            None => Field::Null,
        })
    }
}

impl<T> Field<T> {
    /// Collapse absent and null into `None`.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Absent | Field::Null => None,
        }
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }
}

/// Journal events that carry system faction data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    /// Hyperspace jump into a system.
    FsdJump,
    /// Position report written on game load or respawn.
    Location,
    /// Fleet carrier relocated with the player aboard.
    CarrierJump,
}

impl EventKind {
    /// Map a journal `event` tag to a recognized kind.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "FSDJump" => Some(EventKind::FsdJump),
            "Location" => Some(EventKind::Location),
            "CarrierJump" => Some(EventKind::CarrierJump),
            _ => None,
        }
    }

    /// The journal `event` tag for this kind.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            EventKind::FsdJump => "FSDJump",
            EventKind::Location => "Location",
            EventKind::CarrierJump => "CarrierJump",
        }
    }
}

/// One faction's standing in one system at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactionObservation {
    pub system: String,
    pub faction: String,
    /// Influence percentage, rounded to two decimals.
    pub influence: f64,
    pub state: String,
    pub is_player: bool,
    pub is_native: bool,
    pub timestamp: DateTime<Utc>,
}

impl FactionObservation {
    /// Timestamp rendered as `yyyy-MM-dd HH:mm:ss`.
    #[must_use]
    pub fn last_updated(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// A decoded system arrival event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub kind: EventKind,
    pub system: String,
    pub security: String,
    pub economy: String,
    pub factions: Vec<FactionObservation>,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Timestamp rendered as `yyyy-MM-dd HH:mm:ss`.
    #[must_use]
    pub fn last_updated(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Convert a fractional influence in `[0, 1]` to a percentage with two decimals.
///
/// Midpoints round to even.
#[must_use]
pub fn influence_percent(fraction: f64) -> f64 {
    (fraction * 10_000.0).round_ties_even() / 100.0
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    event: Field<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SystemEvent {
    #[serde(default)]
    star_system: Field<String>,
    #[serde(default, rename = "timestamp")]
    timestamp: Field<DateTime<Utc>>,
    #[serde(default, rename = "SystemSecurity_Localised")]
    security: Field<String>,
    #[serde(default, rename = "SystemEconomy_Localised")]
    economy: Field<String>,
    #[serde(default)]
    factions: Field<Vec<FactionEntry>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FactionEntry {
    #[serde(default)]
    name: Field<String>,
    #[serde(default)]
    influence: Field<f64>,
    #[serde(default)]
    faction_state: Field<String>,
    #[serde(default)]
    squadron_faction: Field<bool>,
    #[serde(default)]
    home_system: Field<bool>,
}

/// Turns raw journal lines into [`LogRecord`]s.
///
/// Stateless: decoding the same line always yields the same result.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineDecoder;

impl LineDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decode one journal line.
    ///
    /// Returns `Ok(None)` for blank lines and for events that carry no faction
    /// data.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the line is not valid JSON, a consumed field
    /// has the wrong type, or a recognized event lacks its system name or
    /// timestamp.
    pub fn decode(&self, line: &str) -> Result<Option<LogRecord>, DecodeError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let envelope: Envelope = serde_json::from_str(line)?;
        let Some(kind) = envelope
            .event
            .into_option()
            .and_then(|tag| EventKind::from_tag(&tag))
        else {
            return Ok(None);
        };

        let event: SystemEvent = serde_json::from_str(line)?;
        let system = event.star_system.into_option().ok_or(DecodeError::MissingField {
            event: kind.tag(),
            field: "StarSystem",
        })?;
        let timestamp = event.timestamp.into_option().ok_or(DecodeError::MissingField {
            event: kind.tag(),
            field: "timestamp",
        })?;

        let factions = event
            .factions
            .into_option()
            .unwrap_or_default()
            .into_iter()
            .map(|entry| FactionObservation {
                system: system.clone(),
                faction: entry.name.into_option().unwrap_or_else(|| UNKNOWN.to_string()),
                influence: influence_percent(entry.influence.into_option().unwrap_or(0.0)),
                state: entry
                    .faction_state
                    .into_option()
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                is_player: entry.squadron_faction.into_option().unwrap_or(false),
                is_native: entry.home_system.into_option().unwrap_or(false),
                timestamp,
            })
            .collect();

        Ok(Some(LogRecord {
            kind,
            system,
            security: event.security.into_option().unwrap_or_else(|| UNKNOWN.to_string()),
            economy: event.economy.into_option().unwrap_or_else(|| UNKNOWN.to_string()),
            factions,
            timestamp,
        }))
    }
}
