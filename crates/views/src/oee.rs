use serde::{Deserialize, Serialize};

use fw_core::entity::{Machine, ProductionMetrics, TimeMetrics};

/// The three OEE factors, each in `[0, 1]`, and their product as a percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OeeBreakdown {
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee_pct: f64,
}

impl OeeBreakdown {
    pub fn from_factors(availability: f64, performance: f64, quality: f64) -> Self {
        let availability = clamp_unit(availability);
        let performance = clamp_unit(performance);
        let quality = clamp_unit(quality);
        let oee = clamp_unit(availability * performance * quality);
        Self { availability, performance, quality, oee_pct: (oee * 100.0).clamp(0.0, 100.0) }
    }
}

/// Per-machine OEE. `None` when the machine has no planned production time configured,
/// which is distinct from a measured 0%.
pub fn machine_oee(machine: &Machine) -> Option<OeeBreakdown> {
    let TimeMetrics { planned_production_time, run_time, .. } = machine.time_metrics;
    let planned = finite(planned_production_time);
    if planned <= 0.0 {
        return None;
    }
    let run = finite(run_time);
    let ProductionMetrics { ideal_cycle_time, total_parts_produced, good_parts, .. } =
        machine.production_metrics;

    Some(OeeBreakdown::from_factors(
        ratio(run, planned),
        ratio(finite(ideal_cycle_time) * total_parts_produced as f64, run),
        ratio(good_parts as f64, total_parts_produced as f64),
    ))
}

/// Non-finite values read as 0.
pub(crate) fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `num / den`, or 0 when the denominator is not positive.
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    finite(value).clamp(0.0, 1.0)
}
