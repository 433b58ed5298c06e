//! Derived views over the fleet: OEE figures, rollups, and the DOWN alert list.
//!
//! Everything here is a pure function of an entity snapshot.

pub mod alerts;
pub mod oee;
pub mod rollup;

pub use alerts::{alert_items, AlertItem, AlertKey};
pub use oee::{machine_oee, OeeBreakdown};
pub use rollup::{
    summarize_department, summarize_factory, summarize_plant, DepartmentSummary, ProductionTotals,
    RollupSummary, Severity, StatusCounts,
};
