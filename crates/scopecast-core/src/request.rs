use serde::{Deserialize, Serialize};

use crate::error::{EstimateError, Result};
use crate::types::RoleRate;

pub const DEFAULT_MIN_DESCRIPTION_CHARS: usize = 50;

/// What the user submits for analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    pub description: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub role_rates: Vec<RoleRate>,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl AnalyzeRequest {
    /// Collect every field problem. Nothing is sent to the generator unless
    /// this returns an empty list.
    pub fn field_errors(&self, min_description_chars: usize) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.project_name.trim().is_empty() {
            errors.push(FieldError::new("projectName", "project name is required"));
        }

        let described = self.description.trim().chars().count();
        if described == 0 {
            errors.push(FieldError::new("description", "description is required"));
        } else if described < min_description_chars {
            errors.push(FieldError::new(
                "description",
                format!(
                    "description must be at least {min_description_chars} characters (got {described})"
                ),
            ));
        }

        if self.currency.trim().is_empty() {
            errors.push(FieldError::new("currency", "currency is required"));
        }

        if self.role_rates.is_empty() {
            errors.push(FieldError::new(
                "roleRates",
                "at least one role rate is required",
            ));
        }
        for (i, rr) in self.role_rates.iter().enumerate() {
            if rr.role.trim().is_empty() {
                errors.push(FieldError::new(
                    format!("roleRates[{i}].role"),
                    "role name is required",
                ));
            }
            if !rr.hourly_rate.is_finite() || rr.hourly_rate <= 0.0 {
                errors.push(FieldError::new(
                    format!("roleRates[{i}].hourlyRate"),
                    format!("rate for '{}' must be greater than zero", rr.role),
                ));
            }
        }

        errors
    }

    pub fn validate(&self, min_description_chars: usize) -> Result<()> {
        let errors = self.field_errors(min_description_chars);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(EstimateError::Validation(errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
