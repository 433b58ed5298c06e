use std::fmt;

use serde::{Deserialize, Serialize};

use fw_core::entity::{Department, Factory, Machine, MachineStatus, Plant};
use fw_core::{EntityRef, Timestamp};

use crate::oee::{finite, ratio, OeeBreakdown};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Ok,
    ActionRequired,
    Critical,
}

impl Severity {
    /// `< 60` critical, `60..=80` action required, `> 80` ok.
    pub fn from_oee_pct(oee_pct: f64) -> Self {
        if oee_pct < 60.0 {
            Severity::Critical
        } else if oee_pct <= 80.0 {
            Severity::ActionRequired
        } else {
            Severity::Ok
        }
    }

    /// Label used by the dashboard and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::ActionRequired => "ACTION_REQUIRED",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: usize,
    pub running: usize,
    pub down: usize,
    pub idle: usize,
    pub warning: usize,
    pub offline: usize,
    pub maintenance: usize,
    /// `down + offline + maintenance`.
    pub critical: usize,
    pub unclassified: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: MachineStatus) {
        self.total += 1;
        match status {
            MachineStatus::Running => self.running += 1,
            MachineStatus::Warning => self.warning += 1,
            MachineStatus::Idle => self.idle += 1,
            MachineStatus::Down => {
                self.down += 1;
                self.critical += 1;
            }
            MachineStatus::Offline => {
                self.offline += 1;
                self.critical += 1;
            }
            MachineStatus::Maintenance => {
                self.maintenance += 1;
                self.critical += 1;
            }
            MachineStatus::Unknown => self.unclassified += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductionTotals {
    pub good_parts: u64,
    pub total_parts: u64,
    /// `good_parts - total_parts`; positive only on inconsistent input.
    pub delta: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RollupSummary {
    pub scope: EntityRef,
    pub severity: Severity,
    pub oee: OeeBreakdown,
    pub counts: StatusCounts,
    pub production: ProductionTotals,
    pub updated_at: Option<Timestamp>,
}

pub type DepartmentSummary = RollupSummary;

/// Summed numerators and denominators; factors are ratios of sums, never averages of ratios.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    counts: StatusCounts,
    planned: f64,
    run: f64,
    ideal_time_for_output: f64,
    good_parts: u64,
    total_parts: u64,
    updated_at: Option<Timestamp>,
}

impl Accumulator {
    fn add(&mut self, machine: &Machine) {
        self.counts.record(machine.status);
        let time = &machine.time_metrics;
        let production = &machine.production_metrics;
        self.planned += finite(time.planned_production_time).max(0.0);
        self.run += finite(time.run_time).max(0.0);
        self.ideal_time_for_output += finite(production.ideal_cycle_time).max(0.0)
            * production.total_parts_produced as f64;
        self.good_parts = self.good_parts.saturating_add(production.good_parts);
        self.total_parts = self.total_parts.saturating_add(production.total_parts_produced);
        if let Some(ts) = machine.updated_at {
            self.updated_at = Some(self.updated_at.map_or(ts, |cur| cur.max(ts)));
        }
    }

    fn finish(self, scope: EntityRef) -> RollupSummary {
        let oee = OeeBreakdown::from_factors(
            ratio(self.run, self.planned),
            ratio(self.ideal_time_for_output, self.run),
            ratio(self.good_parts as f64, self.total_parts as f64),
        );
        RollupSummary {
            scope,
            severity: Severity::from_oee_pct(oee.oee_pct),
            oee,
            counts: self.counts,
            production: ProductionTotals {
                good_parts: self.good_parts,
                total_parts: self.total_parts,
                delta: clamp_i64(self.good_parts as i128 - self.total_parts as i128),
            },
            updated_at: self.updated_at,
        }
    }
}

fn clamp_i64(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

fn summarize<'a>(scope: EntityRef, machines: impl IntoIterator<Item = &'a Machine>) -> RollupSummary {
    let mut acc = Accumulator::default();
    for machine in machines {
        acc.add(machine);
    }
    acc.finish(scope)
}

pub fn summarize_department(department: &Department) -> DepartmentSummary {
    summarize(EntityRef::new(department.id.clone(), department.name.clone()), department.machines())
}

pub fn summarize_plant(plant: &Plant) -> RollupSummary {
    summarize(
        EntityRef::new(plant.id.clone(), plant.name.clone()),
        plant.departments.iter().flat_map(|d| d.machines()),
    )
}

pub fn summarize_factory(factory: &Factory) -> RollupSummary {
    summarize(
        EntityRef::new(factory.id.clone(), factory.name.clone()),
        factory.plants.iter().flat_map(|p| p.departments.iter()).flat_map(|d| d.machines()),
    )
}
