//! Lenient document types accepted at the data-access boundary.
//!
//! Persisted and generated data arrives in several historical shapes: departments with a flat
//! `machines` list, with `zones`, or with `layout.zones`; numbers as JSON numbers, numeric
//! strings or nulls; timestamps as epoch milliseconds or RFC 3339 strings. Everything is folded
//! into the canonical entity tree here, once, so downstream code never branches on shape.

use serde::Deserialize;
use serde_json::Value;

use crate::entity::{
    Department, Factory, Machine, MachineStatus, Plant, ProductionMetrics, ShiftInfo, TimeMetrics,
    Zone,
};
use crate::{parse_timestamp, EntityId, Timestamp};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTimeMetrics {
    #[serde(default)]
    pub planned_production_time: Value,
    #[serde(default)]
    pub run_time: Value,
    #[serde(default)]
    pub idle_time: Value,
    #[serde(default)]
    pub breakdown_time: Value,
    #[serde(default)]
    pub off_time: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProductionMetrics {
    #[serde(default)]
    pub ideal_cycle_time: Value,
    #[serde(default)]
    pub actual_cycle_time: Value,
    #[serde(default)]
    pub total_parts_produced: Value,
    #[serde(default)]
    pub good_parts: Value,
    #[serde(default)]
    pub rejected_parts: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMachine {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Value,
    #[serde(default)]
    pub updated_at: Value,
    #[serde(default)]
    pub time_metrics: Option<RawTimeMetrics>,
    #[serde(default)]
    pub production_metrics: Option<RawProductionMetrics>,
    #[serde(default)]
    pub shift_info: Option<ShiftInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawZone {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub machines: Vec<RawMachine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLayout {
    #[serde(default)]
    pub zones: Option<Vec<RawZone>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDepartment {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub zones: Option<Vec<RawZone>>,
    #[serde(default)]
    pub layout: Option<RawLayout>,
    #[serde(default)]
    pub machines: Option<Vec<RawMachine>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlant {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub departments: Vec<RawDepartment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFactory {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub plants: Vec<RawPlant>,
}

/// A fleet document is either `{"factories": [...]}` or a bare list of factories.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawFleet {
    Wrapped { factories: Vec<RawFactory> },
    Bare(Vec<RawFactory>),
}

impl RawFleet {
    pub fn into_factories(self) -> Vec<Factory> {
        let factories = match self {
            RawFleet::Wrapped { factories } => factories,
            RawFleet::Bare(factories) => factories,
        };
        factories
            .into_iter()
            .enumerate()
            .map(|(i, f)| f.normalize(format!("F{}", i + 1)))
            .collect()
    }
}

impl RawFactory {
    pub fn normalize(self, fallback_id: EntityId) -> Factory {
        let id = entity_id(&self.id, fallback_id);
        let plants = self
            .plants
            .into_iter()
            .enumerate()
            .map(|(i, p)| p.normalize(format!("{id}-P{}", i + 1)))
            .collect();
        Factory { name: self.name.unwrap_or_else(|| id.clone()), id, plants }
    }
}

impl RawPlant {
    pub fn normalize(self, fallback_id: EntityId) -> Plant {
        let id = entity_id(&self.id, fallback_id);
        let departments = self
            .departments
            .into_iter()
            .enumerate()
            .map(|(i, d)| d.normalize(format!("{id}-D{}", i + 1)))
            .collect();
        Plant { name: self.name.unwrap_or_else(|| id.clone()), id, departments }
    }
}

impl RawDepartment {
    /// Picks the first non-empty of `zones`, `layout.zones`, flat `machines`. A flat list is
    /// wrapped into a single `<id>-default` zone.
    pub fn normalize(self, fallback_id: EntityId) -> Department {
        let id = entity_id(&self.id, fallback_id);
        let name = self.name.unwrap_or_else(|| id.clone());

        let zones = self.zones.filter(|z| !z.is_empty());
        let layout_zones = self.layout.and_then(|l| l.zones).filter(|z| !z.is_empty());
        let flat = self.machines.filter(|m| !m.is_empty());

        let zones = if let Some(zones) = zones.or(layout_zones) {
            zones
                .into_iter()
                .enumerate()
                .map(|(i, z)| z.normalize(format!("{id}-Z{}", i + 1)))
                .collect()
        } else if let Some(machines) = flat {
            let zone_id = format!("{id}-default");
            vec![Zone {
                machines: normalize_machines(machines, &zone_id),
                id: zone_id,
                name: String::from("Default"),
            }]
        } else {
            Vec::new()
        };

        Department { id, name, zones }
    }
}

impl RawZone {
    pub fn normalize(self, fallback_id: EntityId) -> Zone {
        let id = entity_id(&self.id, fallback_id);
        Zone {
            name: self.name.unwrap_or_else(|| id.clone()),
            machines: normalize_machines(self.machines, &id),
            id,
        }
    }
}

fn normalize_machines(machines: Vec<RawMachine>, parent: &str) -> Vec<Machine> {
    machines
        .into_iter()
        .enumerate()
        .map(|(i, m)| m.normalize(format!("{parent}-M{}", i + 1)))
        .collect()
}

impl RawMachine {
    pub fn normalize(self, fallback_id: EntityId) -> Machine {
        let id = entity_id(&self.id, fallback_id);
        let status = match &self.status {
            Value::String(s) => MachineStatus::parse(s),
            _ => MachineStatus::Unknown,
        };
        let time_metrics = self.time_metrics.unwrap_or_default();
        let production = self.production_metrics.unwrap_or_default();
        Machine {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            status,
            updated_at: timestamp(&self.updated_at),
            time_metrics: TimeMetrics {
                planned_production_time: number(&time_metrics.planned_production_time),
                run_time: number(&time_metrics.run_time),
                idle_time: number(&time_metrics.idle_time),
                breakdown_time: number(&time_metrics.breakdown_time),
                off_time: number(&time_metrics.off_time),
            },
            production_metrics: ProductionMetrics {
                ideal_cycle_time: number(&production.ideal_cycle_time),
                actual_cycle_time: number(&production.actual_cycle_time),
                total_parts_produced: count(&production.total_parts_produced),
                good_parts: count(&production.good_parts),
                rejected_parts: count(&production.rejected_parts),
            },
            shift_info: self.shift_info,
        }
    }
}

/// Non-negative finite number, or 0.
pub fn number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 {
        n
    } else {
        0.0
    }
}

pub fn count(value: &Value) -> u64 {
    number(value).round() as u64
}

/// Epoch milliseconds from a number, numeric string or RFC 3339 string.
pub fn timestamp(value: &Value) -> Option<Timestamp> {
    let millis = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => Some(n),
            Err(_) => return parse_timestamp(s),
        },
        _ => None,
    }?;
    if millis.is_finite() && millis >= 0.0 {
        Some(millis.round() as Timestamp)
    } else {
        None
    }
}

fn entity_id(value: &Value, fallback: EntityId) -> EntityId {
    match value {
        Value::String(s) if !s.trim().is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn department(doc: Value) -> Department {
        let raw: RawDepartment = serde_json::from_value(doc).unwrap();
        raw.normalize("D-fallback".into())
    }

    #[test]
    fn flat_machine_list_becomes_single_default_zone() {
        let dept = department(json!({
            "id": "D1",
            "name": "Stamping",
            "machines": [{ "id": "M1", "status": "RUNNING" }, { "id": "M2", "status": "DOWN" }]
        }));
        assert_eq!(dept.zones.len(), 1);
        assert_eq!(dept.zones[0].id, "D1-default");
        assert_eq!(dept.zones[0].name, "Default");
        assert_eq!(dept.machine_count(), 2);
    }

    #[test]
    fn layout_zones_and_zones_are_equivalent() {
        let machines = json!([{ "id": "M1", "status": "IDLE" }]);
        let a = department(json!({ "id": "D1", "name": "A", "zones": [{ "id": "Z1", "name": "Z", "machines": machines }] }));
        let b = department(json!({ "id": "D1", "name": "A", "layout": { "zones": [{ "id": "Z1", "name": "Z", "machines": machines }] } }));
        assert_eq!(a, b);
    }

    #[test]
    fn zones_win_over_legacy_shapes_and_empty_lists_fall_through() {
        let dept = department(json!({
            "id": "D1",
            "zones": [],
            "layout": { "zones": [{ "id": "Z9", "machines": [{ "id": "M9" }] }] },
            "machines": [{ "id": "M1" }, { "id": "M2" }]
        }));
        assert_eq!(dept.zones.len(), 1);
        assert_eq!(dept.zones[0].id, "Z9");
        assert_eq!(dept.name, "D1");
    }

    #[test]
    fn department_without_machines_has_no_zones() {
        let dept = department(json!({ "name": "Empty" }));
        assert_eq!(dept.id, "D-fallback");
        assert!(dept.zones.is_empty());
    }

    #[test]
    fn malformed_numbers_coerce_to_zero() {
        let raw: RawMachine = serde_json::from_value(json!({
            "id": 42,
            "status": "running",
            "timeMetrics": { "plannedProductionTime": "28800", "runTime": -5, "idleTime": null, "breakdownTime": "abc" },
            "productionMetrics": { "idealCycleTime": 1.2, "totalPartsProduced": 99.6, "goodParts": "90" }
        }))
        .unwrap();
        let m = raw.normalize("fallback".into());
        assert_eq!(m.id, "42");
        assert_eq!(m.status, MachineStatus::Running);
        assert_eq!(m.time_metrics.planned_production_time, 28_800.0);
        assert_eq!(m.time_metrics.run_time, 0.0);
        assert_eq!(m.time_metrics.idle_time, 0.0);
        assert_eq!(m.time_metrics.breakdown_time, 0.0);
        assert_eq!(m.production_metrics.total_parts_produced, 100);
        assert_eq!(m.production_metrics.good_parts, 90);
        assert_eq!(m.production_metrics.rejected_parts, 0);
    }

    #[test]
    fn unknown_or_non_string_status_is_unclassified() {
        let raw: RawMachine = serde_json::from_value(json!({ "id": "M1", "status": 3 })).unwrap();
        assert_eq!(raw.normalize("x".into()).status, MachineStatus::Unknown);
        let raw: RawMachine = serde_json::from_value(json!({ "id": "M1", "status": "ON_FIRE" })).unwrap();
        assert_eq!(raw.normalize("x".into()).status, MachineStatus::Unknown);
    }

    #[test]
    fn timestamps_accept_millis_and_rfc3339() {
        assert_eq!(timestamp(&json!(1_700_000_000_000u64)), Some(1_700_000_000_000));
        assert_eq!(timestamp(&json!("1700000000000")), Some(1_700_000_000_000));
        assert_eq!(timestamp(&json!("2023-11-14T22:13:20Z")), Some(1_700_000_000_000));
        assert_eq!(timestamp(&json!("not a date")), None);
        assert_eq!(timestamp(&json!(-1)), None);
        assert_eq!(timestamp(&Value::Null), None);
    }

    #[test]
    fn fleet_accepts_wrapped_and_bare_documents() {
        let doc = json!([{ "id": "F1", "plants": [{ "departments": [{ "machines": [{}] }] }] }]);
        let bare: RawFleet = serde_json::from_value(doc.clone()).unwrap();
        let wrapped: RawFleet = serde_json::from_value(json!({ "factories": doc })).unwrap();
        let bare = bare.into_factories();
        assert_eq!(bare, wrapped.into_factories());
        let dept = &bare[0].plants[0].departments[0];
        assert_eq!(dept.id, "F1-P1-D1");
        assert_eq!(dept.zones[0].machines[0].id, "F1-P1-D1-default-M1");
    }
}
