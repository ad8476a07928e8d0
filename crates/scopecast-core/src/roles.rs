use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// RoleKey
// ---------------------------------------------------------------------------

/// Normalized lookup key for a free-text role label.
///
/// Normalization trims, lower-cases and drops every whitespace character.
/// Punctuation is kept, so "Back-end Developer" and "Front-end Developer"
/// stay distinct while "back-end  developer" and "Back-end Developer" meet.
/// Labels that differ only in spacing are the same role, so "QA Engineer"
/// and "QAEngineer" share one key and one rate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleKey(String);

impl RoleKey {
    pub fn normalize(label: &str) -> Self {
        let key = label
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        RoleKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RoleDefinition / Roster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: String,
    /// Suggested hourly rate shown on the input form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RoleDefinition {
    pub fn key(&self) -> RoleKey {
        RoleKey::normalize(&self.name)
    }
}

/// The fixed, ordered set of roles an estimate may assign work to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    roles: Vec<RoleDefinition>,
}

impl Roster {
    pub fn new(roles: Vec<RoleDefinition>) -> Self {
        Self { roles }
    }

    pub fn roles(&self) -> &[RoleDefinition] {
        &self.roles
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Find the roster entry whose normalized key matches `label`.
    pub fn resolve(&self, label: &str) -> Option<&RoleDefinition> {
        let key = RoleKey::normalize(label);
        self.roles.iter().find(|r| r.key() == key)
    }

    /// Names that normalize to the same key as an earlier entry.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.roles
            .iter()
            .filter(|r| !seen.insert(r.key()))
            .map(|r| r.name.as_str())
            .collect()
    }
}

impl Default for Roster {
    fn default() -> Self {
        let role = |name: &str, rate: f64, description: &str| RoleDefinition {
            name: name.to_string(),
            default_rate: Some(rate),
            description: Some(description.to_string()),
        };
        Self::new(vec![
            role(
                "Project Manager",
                60.0,
                "Planning, coordination, stakeholder communication",
            ),
            role(
                "Business Analyst",
                50.0,
                "Requirements elicitation and acceptance criteria",
            ),
            role(
                "UI/UX Designer",
                45.0,
                "User research, wireframes, visual design",
            ),
            role(
                "Front-end Developer",
                50.0,
                "Web client implementation",
            ),
            role(
                "Back-end Developer",
                55.0,
                "APIs, data storage, integrations",
            ),
            role(
                "Mobile Developer",
                55.0,
                "Native or cross-platform mobile clients",
            ),
            role(
                "QA Engineer",
                40.0,
                "Test planning, manual and automated testing",
            ),
            role(
                "DevOps Engineer",
                60.0,
                "Infrastructure, CI/CD, deployment, monitoring",
            ),
        ])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_ignores_case_and_whitespace() {
        assert_eq!(
            RoleKey::normalize("Back-end Developer"),
            RoleKey::normalize("  back-end   DEVELOPER ")
        );
        assert_eq!(RoleKey::normalize("Back-end Developer").as_str(), "back-enddeveloper");
    }

    #[test]
    fn normalize_is_idempotent() {
        for label in ["UI/UX Designer", " QA\tEngineer ", "DevOps Engineer"] {
            let once = RoleKey::normalize(label);
            let twice = RoleKey::normalize(once.as_str());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn spacing_never_separates_roles() {
        assert_eq!(
            RoleKey::normalize("QA Engineer"),
            RoleKey::normalize("QAEngineer")
        );
        assert_ne!(
            RoleKey::normalize("Back-end Developer"),
            RoleKey::normalize("Backend Developer")
        );
    }

    #[test]
    fn default_roster_has_no_key_collisions() {
        let roster = Roster::default();
        assert!(roster.duplicate_names().is_empty());
        assert_ne!(
            RoleKey::normalize("Back-end Developer"),
            RoleKey::normalize("Front-end Developer")
        );
    }

    #[test]
    fn resolve_matches_reformatted_label() {
        let roster = Roster::default();
        let role = roster.resolve("qa engineer").unwrap();
        assert_eq!(role.name, "QA Engineer");
        assert!(roster.resolve("Astronaut").is_none());
    }

    #[test]
    fn duplicate_names_reports_later_entries() {
        let roster = Roster::new(vec![
            RoleDefinition {
                name: "QA Engineer".into(),
                default_rate: None,
                description: None,
            },
            RoleDefinition {
                name: "qa engineer".into(),
                default_rate: None,
                description: None,
            },
        ]);
        assert_eq!(roster.duplicate_names(), vec!["qa engineer"]);
    }
}
