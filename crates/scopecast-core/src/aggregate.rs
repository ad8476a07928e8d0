//! Recomputation of every displayed total from an estimate and the current
//! rate store.
//!
//! [`recompute`] is a pure function: no I/O, no interior mutability, and the
//! output depends only on its two arguments. It runs on every rate edit.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::money::Money;
use crate::rates::RateStore;
use crate::roles::RoleKey;
use crate::types::{EstimateDocument, Level, Task};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCost {
    pub name: String,
    pub role: String,
    pub hours: f64,
    pub effective_rate: f64,
    /// `true` when the rate came from the task itself rather than the store.
    pub uses_task_rate: bool,
    pub cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseCost {
    pub name: String,
    pub complexity: Level,
    pub assigned_role: String,
    pub tasks: Vec<TaskCost>,
    pub hours: f64,
    pub cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTotal {
    pub key: RoleKey,
    /// Label of the first task seen under this key.
    pub role: String,
    pub total_hours: f64,
    pub subtotal_cost: Money,
    /// `subtotal_cost / total_hours`, or the store rate when no hours are
    /// booked against the role.
    pub effective_hourly_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub phases: Vec<PhaseCost>,
    /// Ordered by first appearance across phases.
    pub roles: Vec<RoleTotal>,
    pub total_hours: f64,
    pub total_cost: Money,
}

// ---------------------------------------------------------------------------
// recompute
// ---------------------------------------------------------------------------

/// Price one task: store override if any (zero when cleared), else the
/// task's own generated rate.
pub fn price_task(task: &Task, rates: &RateStore) -> TaskCost {
    let key = RoleKey::normalize(&task.role);
    let (effective_rate, uses_task_rate) = match rates.get_key(&key) {
        Some(rate) => (rate, false),
        None => (task.hourly_rate, true),
    };
    TaskCost {
        name: task.name.clone(),
        role: task.role.clone(),
        hours: task.hours,
        effective_rate,
        uses_task_rate,
        cost: Money::from_hours(task.hours, effective_rate),
    }
}

pub fn recompute(doc: &EstimateDocument, rates: &RateStore) -> Aggregates {
    let mut phases = Vec::with_capacity(doc.phases.len());
    let mut roles: Vec<RoleTotal> = Vec::new();
    let mut role_index: HashMap<RoleKey, usize> = HashMap::new();

    for phase in &doc.phases {
        let tasks: Vec<TaskCost> = phase.tasks.iter().map(|t| price_task(t, rates)).collect();

        for tc in &tasks {
            let key = RoleKey::normalize(&tc.role);
            let idx = *role_index.entry(key.clone()).or_insert_with(|| {
                roles.push(RoleTotal {
                    key,
                    role: tc.role.clone(),
                    total_hours: 0.0,
                    subtotal_cost: Money::ZERO,
                    effective_hourly_rate: 0.0,
                });
                roles.len() - 1
            });
            roles[idx].total_hours += tc.hours;
            roles[idx].subtotal_cost += tc.cost;
        }

        phases.push(PhaseCost {
            name: phase.name.clone(),
            complexity: phase.complexity,
            assigned_role: phase.assigned_role.clone(),
            hours: tasks.iter().map(|t| t.hours).sum(),
            cost: tasks.iter().map(|t| t.cost).sum(),
            tasks,
        });
    }

    for role in &mut roles {
        role.effective_hourly_rate = if role.total_hours > 0.0 {
            role.subtotal_cost.as_f64() / role.total_hours
        } else {
            rates.get_key(&role.key).unwrap_or(0.0)
        };
    }

    Aggregates {
        total_hours: phases.iter().map(|p| p.hours).sum(),
        total_cost: phases.iter().map(|p| p.cost).sum(),
        phases,
        roles,
    }
}

impl Aggregates {
    pub fn phase(&self, name: &str) -> Option<&PhaseCost> {
        self.phases.iter().find(|p| p.name == name)
    }

    pub fn role(&self, label: &str) -> Option<&RoleTotal> {
        let key = RoleKey::normalize(label);
        self.roles.iter().find(|r| r.key == key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
