//! Synthetic fleet generator backing the offline mock-data scripts.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use fw_core::entity::{
    Department, Factory, Machine, MachineStatus, Plant, ProductionMetrics, ShiftInfo, TimeMetrics,
    Zone,
};
use fw_core::{Fleet, Timestamp};

const DEPARTMENT_NAMES: [&str; 6] =
    ["Stamping", "Welding", "Paint", "Assembly", "Machining", "Packaging"];
const MACHINE_KINDS: [&str; 6] = ["CNC", "Press", "Robot", "Lathe", "Conveyor", "Mill"];
const OPERATORS: [&str; 8] =
    ["A. Costa", "B. Okafor", "C. Lindqvist", "D. Tanaka", "E. Moreau", "F. Novak", "G. Singh", "H. Reyes"];
const SHIFTS: [&str; 3] = ["A", "B", "C"];

/// Cumulative weights for the initial status of a generated machine.
const STATUS_WEIGHTS: [(MachineStatus, f64); 6] = [
    (MachineStatus::Running, 0.70),
    (MachineStatus::Idle, 0.80),
    (MachineStatus::Warning, 0.88),
    (MachineStatus::Down, 0.93),
    (MachineStatus::Maintenance, 0.97),
    (MachineStatus::Offline, 1.00),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeedConfig {
    pub factories: usize,
    pub plants_per_factory: usize,
    pub departments_per_plant: usize,
    pub zones_per_department: usize,
    pub machines_per_zone: usize,
    pub seed: u64,
    /// Planned production time per machine, seconds.
    pub shift_seconds: f64,
    /// Latest `updatedAt` handed out; earlier machines trail it by up to an hour.
    pub base_time: Timestamp,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            factories: 1,
            plants_per_factory: 2,
            departments_per_plant: 3,
            zones_per_department: 2,
            machines_per_zone: 6,
            seed: 7,
            shift_seconds: 28_800.0,
            base_time: 1_700_000_000_000,
        }
    }
}

impl SeedConfig {
    pub fn machine_count(&self) -> usize {
        self.factories
            * self.plants_per_factory
            * self.departments_per_plant
            * self.zones_per_department
            * self.machines_per_zone
    }
}

pub fn generate_fleet(cfg: &SeedConfig) -> Fleet {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let factories = (1..=cfg.factories)
        .map(|f| {
            let factory_id = format!("F{f}");
            let plants = (1..=cfg.plants_per_factory)
                .map(|p| {
                    let plant_id = format!("{factory_id}-P{p}");
                    let departments = (1..=cfg.departments_per_plant)
                        .map(|d| generate_department(cfg, &mut rng, &plant_id, d))
                        .collect();
                    Plant { name: format!("Plant {p}"), id: plant_id, departments }
                })
                .collect();
            Factory { name: format!("Factory {f}"), id: factory_id, plants }
        })
        .collect();
    Fleet::new(factories)
}

fn generate_department(cfg: &SeedConfig, rng: &mut StdRng, plant_id: &str, index: usize) -> Department {
    let id = format!("{plant_id}-D{index}");
    let name = DEPARTMENT_NAMES[(index - 1) % DEPARTMENT_NAMES.len()].to_string();
    let zones = (1..=cfg.zones_per_department)
        .map(|z| {
            let zone_id = format!("{id}-Z{z}");
            let machines = (1..=cfg.machines_per_zone)
                .map(|m| generate_machine(cfg, rng, format!("{zone_id}-M{m}")))
                .collect();
            Zone { name: format!("Zone {z}"), id: zone_id, machines }
        })
        .collect();
    Department { id, name, zones }
}

fn generate_machine(cfg: &SeedConfig, rng: &mut StdRng, id: String) -> Machine {
    let kind = MACHINE_KINDS.choose(rng).copied().unwrap_or("Unit");
    let status = pick_status(rng.gen_range(0.0..1.0));

    let planned = cfg.shift_seconds.max(0.0);
    let breakdown_share = match status {
        MachineStatus::Down | MachineStatus::Maintenance => rng.gen_range(0.10..0.30),
        _ => rng.gen_range(0.0..0.08),
    };
    let off_share = if status == MachineStatus::Offline { rng.gen_range(0.2..0.5) } else { 0.0 };
    let idle_share = rng.gen_range(0.0..0.10);
    let breakdown = (planned * breakdown_share).round();
    let off = (planned * off_share).round();
    let idle = (planned * idle_share).round();
    let run = (planned - breakdown - off - idle).max(0.0);

    let ideal_cycle_time = (rng.gen_range(0.8..3.0_f64) * 10.0).round() / 10.0;
    let speed = rng.gen_range(0.70..0.98);
    let total = if ideal_cycle_time > 0.0 { (run * speed / ideal_cycle_time).floor() as u64 } else { 0 };
    let rejected = (total as f64 * rng.gen_range(0.005..0.06)).round() as u64;
    let actual_cycle_time = if total > 0 { run / total as f64 } else { 0.0 };

    let shift_info = ShiftInfo {
        shift_id: SHIFTS.choose(rng).copied().unwrap_or("A").to_string(),
        operator_name: OPERATORS.choose(rng).copied().unwrap_or("Unassigned").to_string(),
    };
    let lag = rng.gen_range(0..3_600_000u64);

    Machine {
        name: format!("{kind} {}", id.rsplit('-').next().unwrap_or(&id)),
        id,
        status,
        updated_at: Some(cfg.base_time.saturating_sub(lag)),
        time_metrics: TimeMetrics {
            planned_production_time: planned,
            run_time: run,
            idle_time: idle,
            breakdown_time: breakdown,
            off_time: off,
        },
        production_metrics: ProductionMetrics {
            ideal_cycle_time,
            actual_cycle_time,
            total_parts_produced: total,
            good_parts: total - rejected.min(total),
            rejected_parts: rejected.min(total),
        },
        shift_info: Some(shift_info),
    }
}

fn pick_status(roll: f64) -> MachineStatus {
    STATUS_WEIGHTS
        .iter()
        .find(|(_, cumulative)| roll < *cumulative)
        .map(|(status, _)| *status)
        .unwrap_or(MachineStatus::Running)
}
