use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use fw_core::{now_ms, CoreError, DepartmentLayout, Fleet, FleetSource, MachineRef, Timestamp};

use crate::simulator::{FleetRevision, FleetStore, TickReport};

/// Shared handle to a [`FleetStore`], serving reads to pollers while the simulator ticks it.
#[derive(Clone)]
pub struct LiveFleet {
    store: Arc<Mutex<FleetStore>>,
    simulated: bool,
}

impl LiveFleet {
    pub fn new(store: FleetStore) -> Self {
        Self { store: Arc::new(Mutex::new(store)), simulated: true }
    }

    /// Marks layouts served from this handle as simulated or not.
    pub fn with_simulated(mut self, simulated: bool) -> Self {
        self.simulated = simulated;
        self
    }

    pub fn tick(&self, now: Timestamp) -> TickReport {
        self.store.lock().tick(now)
    }

    pub fn reset(&self) {
        self.store.lock().reset();
    }

    pub fn subscribe(&self) -> watch::Receiver<FleetRevision> {
        self.store.lock().subscribe()
    }

    pub fn snapshot(&self) -> Fleet {
        self.store.lock().fleet().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&Fleet) -> R) -> R {
        f(self.store.lock().fleet())
    }
}

#[async_trait]
impl FleetSource for LiveFleet {
    async fn machines_snapshot(&self) -> Result<Vec<MachineRef>, CoreError> {
        Ok(self.read(|fleet| fleet.machines_snapshot()))
    }

    async fn department_layout(&self, department_id: &str) -> Result<DepartmentLayout, CoreError> {
        let now = now_ms();
        self.read(|fleet| fleet.department_layout(department_id, self.simulated, now))
    }
}
