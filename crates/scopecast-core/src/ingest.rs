use serde::{Deserialize, Serialize};

use crate::duration::MAX_WEEKS;
use crate::error::{EstimateError, Result};
use crate::money::{MAX_HOURLY_RATE, MAX_TASK_HOURS};
use crate::roles::Roster;
use crate::types::EstimateDocument;

// ---------------------------------------------------------------------------
// UnmatchedRolePolicy
// ---------------------------------------------------------------------------

/// What to do with a task whose role label is not on the roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedRolePolicy {
    /// Keep the task and record it; the task is priced at its own rate
    /// unless the user sets one for its label.
    #[default]
    Quarantine,
    /// Fail ingestion.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantinedRole {
    pub phase: String,
    pub task: String,
    pub label: String,
}

/// A document that passed shape validation, with role labels coerced onto
/// the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingested {
    pub document: EstimateDocument,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quarantined: Vec<QuarantinedRole>,
}

// ---------------------------------------------------------------------------
// ingest
// ---------------------------------------------------------------------------

/// Validate `document` and canonicalize its role labels.
///
/// Takes the document by value and either returns it whole or fails; the
/// caller's current estimate is never touched on error.
pub fn ingest(
    mut document: EstimateDocument,
    roster: &Roster,
    policy: UnmatchedRolePolicy,
) -> Result<Ingested> {
    check_shape(&document)?;

    for rate in &mut document.role_rates {
        if let Some(def) = roster.resolve(&rate.role) {
            rate.role = def.name.clone();
        }
    }

    let mut quarantined = Vec::new();
    for phase in &mut document.phases {
        if let Some(def) = roster.resolve(&phase.assigned_role) {
            phase.assigned_role = def.name.clone();
        }
        for task in &mut phase.tasks {
            match roster.resolve(&task.role) {
                Some(def) => task.role = def.name.clone(),
                None => match policy {
                    UnmatchedRolePolicy::Reject => {
                        return Err(EstimateError::UnknownRole {
                            label: task.role.clone(),
                            task: task.name.clone(),
                        });
                    }
                    UnmatchedRolePolicy::Quarantine => {
                        tracing::warn!(
                            phase = %phase.name,
                            task = %task.name,
                            role = %task.role,
                            "task role is not on the roster; using the task's own rate"
                        );
                        quarantined.push(QuarantinedRole {
                            phase: phase.name.clone(),
                            task: task.name.clone(),
                            label: task.role.clone(),
                        });
                    }
                },
            }
        }
    }

    tracing::debug!(
        project = %document.project_name,
        phases = document.phases.len(),
        quarantined = quarantined.len(),
        "estimate ingested"
    );

    Ok(Ingested {
        document,
        quarantined,
    })
}

fn check_shape(doc: &EstimateDocument) -> Result<()> {
    if doc.phases.is_empty() {
        return Err(shape("phases", "at least one phase is required"));
    }
    for (i, rate) in doc.role_rates.iter().enumerate() {
        check_bounded(
            rate.hourly_rate,
            MAX_HOURLY_RATE,
            &format!("roleRates[{i}].hourlyRate"),
        )?;
    }
    let max_weeks = i64::from(MAX_WEEKS);
    for (i, interval) in doc.roadmap.iter().enumerate() {
        if interval.start_week > max_weeks || interval.end_week > max_weeks {
            return Err(shape(
                &format!("roadmap[{i}]"),
                &format!("weeks must not exceed {MAX_WEEKS}"),
            ));
        }
    }
    if doc.duration_weeks.max > f64::from(MAX_WEEKS) {
        return Err(shape(
            "durationWeeks.max",
            &format!("must not exceed {MAX_WEEKS}"),
        ));
    }
    for (p, phase) in doc.phases.iter().enumerate() {
        if phase.tasks.is_empty() {
            return Err(shape(
                &format!("phases[{p}].tasks"),
                "every phase needs at least one task",
            ));
        }
        for (t, task) in phase.tasks.iter().enumerate() {
            check_bounded(
                task.hours,
                MAX_TASK_HOURS,
                &format!("phases[{p}].tasks[{t}].hours"),
            )?;
            check_bounded(
                task.hourly_rate,
                MAX_HOURLY_RATE,
                &format!("phases[{p}].tasks[{t}].hourlyRate"),
            )?;
        }
    }
    Ok(())
}

fn check_bounded(v: f64, max: f64, path: &str) -> Result<()> {
    if !(v.is_finite() && v >= 0.0) {
        return Err(shape(path, "must be a finite, non-negative number"));
    }
    if v > max {
        return Err(shape(path, &format!("must not exceed {max}")));
    }
    Ok(())
}

fn shape(path: &str, reason: &str) -> EstimateError {
    EstimateError::Shape {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
