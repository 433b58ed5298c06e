use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entity::{Department, Factory, Machine};
use crate::raw::RawFleet;
use crate::{format_timestamp, CoreError, EntityRef, Timestamp};

/// A machine together with its ancestry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineRef {
    pub factory: EntityRef,
    pub plant: EntityRef,
    pub department: EntityRef,
    pub machine: Machine,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneLayout {
    pub zones: Vec<crate::entity::Zone>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMeta {
    pub simulated: bool,
    /// RFC 3339.
    pub fetched_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepartmentLayout {
    pub department: EntityRef,
    pub layout: ZoneLayout,
    pub meta: LayoutMeta,
}

impl DepartmentLayout {
    pub fn into_department(self) -> Department {
        Department { id: self.department.id, name: self.department.name, zones: self.layout.zones }
    }
}

/// Owned hierarchy of factories; the canonical in-memory snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Fleet {
    pub factories: Vec<Factory>,
}

impl Fleet {
    pub fn new(factories: Vec<Factory>) -> Self {
        Self { factories }
    }

    /// Parses any accepted fleet document shape into canonical form.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let raw: RawFleet = serde_json::from_str(text)?;
        Ok(Self::new(raw.into_factories()))
    }

    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn machine_count(&self) -> usize {
        self.departments().map(|(_, _, d)| d.machine_count()).sum()
    }

    pub fn departments(&self) -> impl Iterator<Item = (&Factory, &crate::entity::Plant, &Department)> {
        self.factories.iter().flat_map(|f| {
            f.plants.iter().flat_map(move |p| p.departments.iter().map(move |d| (f, p, d)))
        })
    }

    pub fn machines_mut(&mut self) -> impl Iterator<Item = &mut Machine> {
        self.factories
            .iter_mut()
            .flat_map(|f| f.plants.iter_mut())
            .flat_map(|p| p.departments.iter_mut())
            .flat_map(|d| d.machines_mut())
    }

    pub fn department(&self, department_id: &str) -> Result<&Department, CoreError> {
        self.departments()
            .map(|(_, _, d)| d)
            .find(|d| d.id == department_id)
            .ok_or_else(|| CoreError::not_found("department", department_id))
    }

    pub fn machine(&self, machine_id: &str) -> Result<MachineRef, CoreError> {
        self.machines_snapshot()
            .into_iter()
            .find(|r| r.machine.id == machine_id)
            .ok_or_else(|| CoreError::not_found("machine", machine_id))
    }

    /// Flattened view of every machine with its factory/plant/department context.
    pub fn machines_snapshot(&self) -> Vec<MachineRef> {
        let mut out = Vec::with_capacity(self.machine_count());
        for (factory, plant, dept) in self.departments() {
            let factory_ref = EntityRef::new(factory.id.clone(), factory.name.clone());
            let plant_ref = EntityRef::new(plant.id.clone(), plant.name.clone());
            let dept_ref = EntityRef::new(dept.id.clone(), dept.name.clone());
            for machine in dept.machines() {
                out.push(MachineRef {
                    factory: factory_ref.clone(),
                    plant: plant_ref.clone(),
                    department: dept_ref.clone(),
                    machine: machine.clone(),
                });
            }
        }
        out
    }

    pub fn department_layout(
        &self,
        department_id: &str,
        simulated: bool,
        now: Timestamp,
    ) -> Result<DepartmentLayout, CoreError> {
        let dept = self.department(department_id)?;
        Ok(DepartmentLayout {
            department: EntityRef::new(dept.id.clone(), dept.name.clone()),
            layout: ZoneLayout { zones: dept.zones.clone() },
            meta: LayoutMeta { simulated, fetched_at: format_timestamp(now) },
        })
    }
}

/// Read side of the data-access layer. Every call may suspend and may fail.
#[async_trait]
pub trait FleetSource: Send + Sync {
    async fn machines_snapshot(&self) -> Result<Vec<MachineRef>, CoreError>;

    async fn department_layout(&self, department_id: &str) -> Result<DepartmentLayout, CoreError>;
}
