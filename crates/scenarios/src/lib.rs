//! Synthetic fleet data: the seed generator and the live status simulator.

pub mod live;
pub mod seed;
pub mod simulator;

pub use live::LiveFleet;
pub use seed::{generate_fleet, SeedConfig};
pub use simulator::{FleetRevision, FleetStore, SimulatorConfig, TickReport};
