//! Core entity model and data-access seam for Floorwatch.

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;
pub type EntityId = String;

/// Identity plus display name, used for ancestry context on flattened views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub id: EntityId,
    pub name: String,
}

impl EntityRef {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: EntityId },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("fleet source unavailable: {0}")]
    Source(String),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl Into<EntityId>) -> Self {
        CoreError::NotFound { kind, id: id.into() }
    }
}

/// Formats an epoch-millisecond timestamp as RFC 3339, falling back to the epoch on overflow.
pub fn format_timestamp(ts: Timestamp) -> String {
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    let nanos = i128::from(ts) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

/// Wall-clock time in epoch milliseconds.
pub fn now_ms() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(0)
}

/// Parses an RFC 3339 string into epoch milliseconds. Pre-epoch instants are rejected.
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    let parsed = OffsetDateTime::parse(text.trim(), &Rfc3339).ok()?;
    let millis = parsed.unix_timestamp_nanos() / 1_000_000;
    u64::try_from(millis).ok()
}

pub mod entity;
pub mod fleet;
pub mod raw;

pub use entity::{
    Department, Factory, Machine, MachineStatus, Plant, ProductionMetrics, ShiftInfo, TimeMetrics,
    Zone,
};
pub use fleet::{DepartmentLayout, Fleet, FleetSource, LayoutMeta, MachineRef, ZoneLayout};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_through_rfc3339() {
        let ts: Timestamp = 1_700_000_000_123;
        let text = format_timestamp(ts);
        assert!(text.starts_with("2023-11-14T"));
        assert_eq!(parse_timestamp(&text), Some(ts));
    }

    #[test]
    fn pre_epoch_and_garbage_timestamps_are_rejected() {
        assert_eq!(parse_timestamp("1969-12-31T23:59:59Z"), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn not_found_reads_naturally() {
        let err = CoreError::not_found("department", "D-9");
        assert_eq!(err.to_string(), "department not found: D-9");
    }
}
