use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use fw_core::{EntityId, Fleet, Timestamp};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulatorConfig {
    pub tick_ms: u64,
    /// Fraction of the fleet advanced per tick, before the floor/ceiling are applied.
    pub sample_ratio: f64,
    pub min_sample: usize,
    pub max_sample: usize,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { tick_ms: 2_000, sample_ratio: 0.15, min_sample: 12, max_sample: 60, seed: None }
    }
}

impl SimulatorConfig {
    /// `clamp(floor(total * ratio), min, max)`, never more than `total`.
    pub fn sample_size(&self, total: usize) -> usize {
        let ratio = if self.sample_ratio.is_finite() { self.sample_ratio.max(0.0) } else { 0.0 };
        let scaled = (total as f64 * ratio).floor() as usize;
        scaled.max(self.min_sample).min(self.max_sample).min(total)
    }
}

/// Bumped after every mutation so subscribers can tell a fresh snapshot from a stale one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetRevision {
    pub epoch: u64,
    pub at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub epoch: u64,
    pub at: Timestamp,
    /// Advanced machines, in fleet order.
    pub advanced: Vec<EntityId>,
}

/// Owns the live fleet. The simulator is its only writer: each [`FleetStore::tick`] advances a
/// sample of machines one step along the status cycle.
pub struct FleetStore {
    fleet: Fleet,
    seed_state: Fleet,
    cfg: SimulatorConfig,
    rng: StdRng,
    epoch: u64,
    notify: watch::Sender<FleetRevision>,
}

impl FleetStore {
    pub fn new(fleet: Fleet, cfg: SimulatorConfig) -> Self {
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (notify, _) = watch::channel(FleetRevision::default());
        Self { seed_state: fleet.clone(), fleet, cfg, rng, epoch: 0, notify }
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.cfg
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn subscribe(&self) -> watch::Receiver<FleetRevision> {
        self.notify.subscribe()
    }

    pub fn tick(&mut self, now: Timestamp) -> TickReport {
        let total = self.fleet.machine_count();
        let amount = self.cfg.sample_size(total);

        let mut selected = vec![false; total];
        for idx in rand::seq::index::sample(&mut self.rng, total, amount).iter() {
            selected[idx] = true;
        }

        let mut advanced = Vec::with_capacity(amount);
        for (machine, pick) in self.fleet.machines_mut().zip(selected) {
            if pick {
                machine.status = machine.status.next_in_cycle();
                machine.updated_at = Some(now);
                advanced.push(machine.id.clone());
            }
        }

        self.epoch += 1;
        debug!(epoch = self.epoch, total, advanced = advanced.len(), "simulator tick");
        self.notify.send_replace(FleetRevision { epoch: self.epoch, at: Some(now) });
        TickReport { epoch: self.epoch, at: now, advanced }
    }

    /// Restores the fleet the store was created with.
    pub fn reset(&mut self) {
        self.fleet = self.seed_state.clone();
        self.epoch += 1;
        self.notify.send_replace(FleetRevision { epoch: self.epoch, at: None });
    }
}
