use serde::{Deserialize, Serialize};

use fw_core::entity::MachineStatus;
use fw_core::{EntityId, EntityRef, MachineRef, Timestamp};

/// Identity of an alert. Machine ids are only unique within their department.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertKey {
    pub factory: EntityId,
    pub plant: EntityId,
    pub department: EntityId,
    pub machine: EntityId,
}

impl AlertKey {
    pub fn new(
        factory: impl Into<EntityId>,
        plant: impl Into<EntityId>,
        department: impl Into<EntityId>,
        machine: impl Into<EntityId>,
    ) -> Self {
        Self {
            factory: factory.into(),
            plant: plant.into(),
            department: department.into(),
            machine: machine.into(),
        }
    }
}

/// A machine currently DOWN, with its ancestry and a display message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertItem {
    pub factory: EntityRef,
    pub plant: EntityRef,
    pub department: EntityRef,
    pub machine: EntityRef,
    pub since: Option<Timestamp>,
    pub message: String,
}

impl AlertItem {
    pub fn machine_id(&self) -> &EntityId {
        &self.machine.id
    }

    pub fn key(&self) -> AlertKey {
        AlertKey::new(
            self.factory.id.clone(),
            self.plant.id.clone(),
            self.department.id.clone(),
            self.machine.id.clone(),
        )
    }

    fn from_ref(r: &MachineRef) -> Self {
        let machine = EntityRef::new(r.machine.id.clone(), r.machine.name.clone());
        let message = format!(
            "{} is DOWN in {} / {} / {}",
            machine.name, r.factory.name, r.plant.name, r.department.name
        );
        Self {
            factory: r.factory.clone(),
            plant: r.plant.clone(),
            department: r.department.clone(),
            machine,
            since: r.machine.updated_at,
            message,
        }
    }
}

/// Every DOWN machine in snapshot order.
pub fn alert_items(snapshot: &[MachineRef]) -> Vec<AlertItem> {
    snapshot
        .iter()
        .filter(|r| r.machine.status == MachineStatus::Down)
        .map(AlertItem::from_ref)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fw_core::entity::Machine;

    fn entry(id: &str, status: MachineStatus) -> MachineRef {
        let mut machine = Machine::new(id, format!("Machine {id}"), status);
        machine.updated_at = Some(42);
        MachineRef {
            factory: EntityRef::new("F1", "North Works"),
            plant: EntityRef::new("P1", "Body"),
            department: EntityRef::new("D1", "Press"),
            machine,
        }
    }

    #[test]
    fn only_down_machines_become_alerts() {
        let snapshot = vec![
            entry("M1", MachineStatus::Running),
            entry("M2", MachineStatus::Down),
            entry("M3", MachineStatus::Offline),
            entry("M4", MachineStatus::Down),
        ];
        let alerts = alert_items(&snapshot);
        let ids: Vec<_> = alerts.iter().map(|a| a.machine_id().as_str()).collect();
        assert_eq!(ids, vec!["M2", "M4"]);
        assert_eq!(alerts[0].since, Some(42));
        assert_eq!(alerts[0].message, "Machine M2 is DOWN in North Works / Body / Press");
        assert_eq!(alerts[1].key(), AlertKey::new("F1", "P1", "D1", "M4"));
    }
}
