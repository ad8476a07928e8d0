use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EstimateError, Result};

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Three-step scale used for phase complexity and risk impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    #[serde(alias = "low", alias = "Low")]
    Low,
    #[serde(alias = "medium", alias = "Medium")]
    Medium,
    #[serde(alias = "high", alias = "High")]
    High,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "LOW",
            Level::Medium => "MEDIUM",
            Level::High => "HIGH",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ValueRange
// ---------------------------------------------------------------------------

/// Advisory min/max pair from the generated estimate. Passed through for
/// display; never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

// ---------------------------------------------------------------------------
// Document records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRate {
    pub role: String,
    pub hourly_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdownItem {
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapInterval {
    pub phase: String,
    /// 1-based; values below 1 are clamped when resolved.
    pub start_week: i64,
    pub end_week: i64,
    #[serde(default)]
    pub milestone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechStackItem {
    pub category: String,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub name: String,
    pub hours: f64,
    pub role: String,
    /// Rate the generator priced this task at. Used only when the rate
    /// store has no entry for the task's role.
    pub hourly_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub complexity: Level,
    pub assigned_role: String,
    pub tasks: Vec<Task>,
    /// Advisory only; recomputed hours are authoritative.
    #[serde(default)]
    pub estimated_hours: f64,
    /// Advisory only; recomputed cost is authoritative.
    #[serde(default)]
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub title: String,
    pub impact: Level,
    #[serde(default)]
    pub mitigation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub role: String,
    pub count: u32,
    #[serde(default)]
    pub allocation: String,
}

// ---------------------------------------------------------------------------
// EstimateDocument
// ---------------------------------------------------------------------------

/// The generated project estimate. Immutable once ingested; a new analysis
/// replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateDocument {
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    pub summary: String,
    pub currency: String,
    pub total_cost: ValueRange,
    pub total_hours: ValueRange,
    pub duration_weeks: ValueRange,
    pub role_rates: Vec<RoleRate>,
    pub cost_breakdown: Vec<CostBreakdownItem>,
    pub roadmap: Vec<RoadmapInterval>,
    pub tech_stack: Vec<TechStackItem>,
    pub phases: Vec<Phase>,
    pub risks: Vec<Risk>,
    pub team_composition: Vec<TeamMember>,
}

impl EstimateDocument {
    /// Parse a JSON document. Any syntax or shape mismatch is reported as
    /// [`EstimateError::Malformed`].
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| EstimateError::Malformed(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.phases.iter().flat_map(|p| p.tasks.iter())
    }
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures {
    use super::*;

    pub fn task(name: &str, hours: f64, role: &str, rate: f64) -> Task {
        Task {
            name: name.to_string(),
            hours,
            role: role.to_string(),
            hourly_rate: rate,
        }
    }

    pub fn phase(name: &str, role: &str, tasks: Vec<Task>) -> Phase {
        Phase {
            name: name.to_string(),
            description: String::new(),
            complexity: Level::Medium,
            assigned_role: role.to_string(),
            tasks,
            estimated_hours: 0.0,
            estimated_cost: 0.0,
        }
    }

    pub fn interval(phase: &str, start: i64, end: i64) -> RoadmapInterval {
        RoadmapInterval {
            phase: phase.to_string(),
            start_week: start,
            end_week: end,
            milestone: String::new(),
        }
    }

    /// A small, internally consistent document used across module tests.
    pub fn sample_document() -> EstimateDocument {
        EstimateDocument {
            project_name: "Clinic Booking".to_string(),
            project_type: Some("Web application".to_string()),
            summary: "Appointment booking portal for a dental clinic".to_string(),
            currency: "USD".to_string(),
            total_cost: ValueRange {
                min: 9000.0,
                max: 12000.0,
            },
            total_hours: ValueRange {
                min: 150.0,
                max: 200.0,
            },
            duration_weeks: ValueRange { min: 6.0, max: 9.0 },
            role_rates: vec![
                RoleRate {
                    role: "UI/UX Designer".to_string(),
                    hourly_rate: 45.0,
                },
                RoleRate {
                    role: "Back-end Developer".to_string(),
                    hourly_rate: 55.0,
                },
                RoleRate {
                    role: "Front-end Developer".to_string(),
                    hourly_rate: 50.0,
                },
            ],
            cost_breakdown: vec![CostBreakdownItem {
                category: "Development".to_string(),
                amount: 8000.0,
                percentage: 80.0,
            }],
            roadmap: vec![
                interval("Design", 1, 2),
                interval("Backend", 3, 6),
                interval("Frontend", 3, 6),
                interval("QA", 7, 8),
            ],
            tech_stack: vec![TechStackItem {
                category: "Backend".to_string(),
                technologies: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            }],
            phases: vec![
                phase(
                    "Design",
                    "UI/UX Designer",
                    vec![task("Wireframes", 16.0, "UI/UX Designer", 45.0)],
                ),
                phase(
                    "Backend",
                    "Back-end Developer",
                    vec![
                        task("Booking API", 40.0, "Back-end Developer", 55.0),
                        task("Notifications", 10.0, "back-end developer", 55.0),
                    ],
                ),
                phase(
                    "Frontend",
                    "Front-end Developer",
                    vec![task("Booking UI", 32.0, "Front-end Developer", 50.0)],
                ),
                phase(
                    "QA",
                    "QA Engineer",
                    vec![task("Regression pass", 12.0, "QA Engineer", 40.0)],
                ),
            ],
            risks: vec![Risk {
                title: "Calendar sync edge cases".to_string(),
                impact: Level::Medium,
                mitigation: "Prototype the sync early".to_string(),
            }],
            team_composition: vec![TeamMember {
                role: "Back-end Developer".to_string(),
                count: 1,
                allocation: "full-time".to_string(),
            }],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
