use serde::{Deserialize, Serialize};

use crate::{EntityId, Timestamp};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineStatus {
    Running,
    Warning,
    Down,
    Offline,
    Maintenance,
    Idle,
    /// Anything the feed reports that is not one of the known states.
    Unknown,
}

impl MachineStatus {
    /// Order the simulator walks through; `Idle` and `Unknown` are not part of it.
    pub const CYCLE: [MachineStatus; 5] = [
        MachineStatus::Running,
        MachineStatus::Warning,
        MachineStatus::Down,
        MachineStatus::Offline,
        MachineStatus::Maintenance,
    ];

    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "RUNNING" => MachineStatus::Running,
            "WARNING" => MachineStatus::Warning,
            "DOWN" => MachineStatus::Down,
            "OFFLINE" => MachineStatus::Offline,
            "MAINTENANCE" => MachineStatus::Maintenance,
            "IDLE" => MachineStatus::Idle,
            _ => MachineStatus::Unknown,
        }
    }

    /// Next status in [`Self::CYCLE`], wrapping. States outside the cycle restart at `Running`.
    pub fn next_in_cycle(self) -> Self {
        match Self::CYCLE.iter().position(|s| *s == self) {
            Some(pos) => Self::CYCLE[(pos + 1) % Self::CYCLE.len()],
            None => MachineStatus::Running,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MachineStatus::Running => "RUNNING",
            MachineStatus::Warning => "WARNING",
            MachineStatus::Down => "DOWN",
            MachineStatus::Offline => "OFFLINE",
            MachineStatus::Maintenance => "MAINTENANCE",
            MachineStatus::Idle => "IDLE",
            MachineStatus::Unknown => "UNKNOWN",
        }
    }
}

impl From<String> for MachineStatus {
    fn from(text: String) -> Self {
        MachineStatus::parse(&text)
    }
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durations in seconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeMetrics {
    pub planned_production_time: f64,
    pub run_time: f64,
    pub idle_time: f64,
    pub breakdown_time: f64,
    pub off_time: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductionMetrics {
    /// Seconds per unit at rated speed.
    pub ideal_cycle_time: f64,
    pub actual_cycle_time: f64,
    pub total_parts_produced: u64,
    pub good_parts: u64,
    pub rejected_parts: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ShiftInfo {
    pub shift_id: String,
    pub operator_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: EntityId,
    pub name: String,
    pub status: MachineStatus,
    pub updated_at: Option<Timestamp>,
    pub time_metrics: TimeMetrics,
    pub production_metrics: ProductionMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_info: Option<ShiftInfo>,
}

impl Machine {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, status: MachineStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            updated_at: None,
            time_metrics: TimeMetrics::default(),
            production_metrics: ProductionMetrics::default(),
            shift_info: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zone {
    pub id: EntityId,
    pub name: String,
    pub machines: Vec<Machine>,
}

/// Canonical shape: a department owns zones, zones own machines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: EntityId,
    pub name: String,
    pub zones: Vec<Zone>,
}

impl Department {
    pub fn machines(&self) -> impl Iterator<Item = &Machine> {
        self.zones.iter().flat_map(|z| z.machines.iter())
    }

    pub fn machines_mut(&mut self) -> impl Iterator<Item = &mut Machine> {
        self.zones.iter_mut().flat_map(|z| z.machines.iter_mut())
    }

    pub fn machine_count(&self) -> usize {
        self.zones.iter().map(|z| z.machines.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plant {
    pub id: EntityId,
    pub name: String,
    pub departments: Vec<Department>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Factory {
    pub id: EntityId,
    pub name: String,
    pub plants: Vec<Plant>,
}
