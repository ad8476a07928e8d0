//! Fixed instructions sent with every analysis.

use scopecast_core::duration::{HOURS_PER_RESOURCE_WEEK, WORK_DAYS_PER_WEEK, WORK_HOURS_PER_DAY};
use scopecast_core::request::AnalyzeRequest;
use scopecast_core::roles::Roster;
use std::fmt::Write as _;

/// System instruction: role definitions plus the arithmetic rules every
/// estimate must follow.
pub fn system_instruction(roster: &Roster) -> String {
    let mut out = String::new();
    out.push_str(
        "You are a senior delivery manager at a software agency. You turn a client's \
         product description into a costed delivery plan.\n\n",
    );

    out.push_str("## Roles\n");
    out.push_str("Assign every task to exactly one of these roles, spelled exactly as listed:\n");
    for role in roster.roles() {
        match &role.description {
            Some(d) => {
                let _ = writeln!(out, "- {}: {}", role.name, d);
            }
            None => {
                let _ = writeln!(out, "- {}", role.name);
            }
        }
    }

    let _ = write!(
        out,
        "\n## Arithmetic rules\n\
         - A working week has {days} productive days of {hours} hours: \
         {capacity} productive hours per resource-week.\n\
         - Task cost = task hours x the hourly rate of the task's role.\n\
         - Phase hours and cost are the sums over the phase's tasks.\n\
         - Project duration follows the critical path. Phases that can run in \
         parallel (for example front-end and back-end work) overlap in the roadmap; \
         duration is the latest end week, not the sum of phase lengths.\n\
         - Weeks are numbered from 1. Week 0 does not exist. Every roadmap entry has \
         startWeek >= 1 and endWeek >= startWeek.\n\
         - Every phase has at least one task.\n\
         - Give min/max ranges for total cost, total hours and duration in weeks.\n",
        days = WORK_DAYS_PER_WEEK,
        hours = WORK_HOURS_PER_DAY,
        capacity = HOURS_PER_RESOURCE_WEEK,
    );

    out.push_str(
        "\nRespond with JSON only, matching the response schema. No prose, no markdown.\n",
    );
    out
}

/// User instruction: project metadata, the client's rates and the free-text
/// requirements.
pub fn user_instruction(request: &AnalyzeRequest) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Project name: {}", request.project_name.trim());
    if let Some(kind) = request.project_type.as_deref().filter(|k| !k.trim().is_empty()) {
        let _ = writeln!(out, "Project type: {}", kind.trim());
    }
    let _ = writeln!(out, "Currency: {}", request.currency.trim());

    if !request.role_rates.is_empty() {
        out.push_str("\nHourly rates to use:\n");
        for rr in &request.role_rates {
            let _ = writeln!(out, "- {}: {} {}", rr.role.trim(), rr.hourly_rate, request.currency.trim());
        }
    }

    out.push_str("\nRequirements:\n");
    out.push_str(request.description.trim());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopecast_core::types::RoleRate;

    fn request() -> AnalyzeRequest {
        AnalyzeRequest {
            project_name: " Clinic Booking ".into(),
            project_type: Some("Web application".into()),
            description: "Patients book appointments online.".into(),
            currency: "EUR".into(),
            role_rates: vec![RoleRate {
                role: "Back-end Developer".into(),
                hourly_rate: 55.0,
            }],
        }
    }

    #[test]
    fn system_instruction_states_the_capacity_rule() {
        let text = system_instruction(&Roster::default());
        assert!(text.contains("4 productive days of 6 hours"));
        assert!(text.contains("24 productive hours per resource-week"));
        assert!(text.contains("Week 0 does not exist"));
        assert!(text.contains("critical path"));
    }

    #[test]
    fn system_instruction_lists_roster() {
        let text = system_instruction(&Roster::default());
        for role in Roster::default().roles() {
            assert!(text.contains(&role.name), "missing {}", role.name);
        }
    }

    #[test]
    fn user_instruction_carries_metadata_and_rates() {
        let text = user_instruction(&request());
        assert!(text.starts_with("Project name: Clinic Booking\n"));
        assert!(text.contains("Project type: Web application"));
        assert!(text.contains("- Back-end Developer: 55 EUR"));
        assert!(text.ends_with("Patients book appointments online.\n"));
    }

    #[test]
    fn user_instruction_skips_blank_type() {
        let mut req = request();
        req.project_type = Some("  ".into());
        assert!(!user_instruction(&req).contains("Project type"));
    }
}
