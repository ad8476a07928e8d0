use crate::cmd::parse_rate_arg;
use crate::context::{today_or, Context};
use crate::output::{hours, print_json, print_table, rate};
use chrono::NaiveDate;
use clap::Args;
use scopecast_core::rates::RateEntry;
use scopecast_core::session::{EstimateReport, Workspace};
use std::path::PathBuf;

#[derive(Args)]
pub struct ReportArgs {
    /// Saved estimate document (JSON)
    pub file: PathBuf,

    /// Override a role's hourly rate, repeatable
    #[arg(long = "rate", value_name = "ROLE=RATE", value_parser = parse_rate_arg)]
    pub rates: Vec<(String, String)>,

    /// Clear a role's rate (prices its tasks at zero), repeatable
    #[arg(long = "clear", value_name = "ROLE")]
    pub clears: Vec<String>,

    /// Date the timeline is anchored from (YYYY-MM-DD)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

pub fn run(ctx: &Context, args: ReportArgs, json: bool) -> anyhow::Result<()> {
    let report = build_report(ctx, &args.file, &args.rates, &args.clears, args.today)?;
    if json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

/// Load, apply overrides in order (rates, then clears), and derive.
pub fn build_report(
    ctx: &Context,
    file: &std::path::Path,
    rates: &[(String, String)],
    clears: &[String],
    today: Option<NaiveDate>,
) -> anyhow::Result<EstimateReport> {
    let mut workspace = Workspace::new(ctx.read_estimate(file)?);
    for (role, raw) in rates {
        workspace.set_rate(role, raw)?;
    }
    for role in clears {
        workspace.set_rate(role, "")?;
    }
    Ok(workspace.report(today_or(today)))
}

fn print_report(report: &EstimateReport) {
    println!("{} ({})", report.project_name, report.currency);
    println!();

    let phase_rows = report
        .aggregates
        .phases
        .iter()
        .map(|p| {
            vec![
                p.name.clone(),
                p.complexity.to_string(),
                hours(p.hours),
                p.cost.to_string(),
            ]
        })
        .collect();
    print_table(&["PHASE", "COMPLEXITY", "HOURS", "COST"], phase_rows);
    println!();

    let role_rows = report
        .aggregates
        .roles
        .iter()
        .map(|r| {
            vec![
                r.role.clone(),
                hours(r.total_hours),
                rate(r.effective_hourly_rate),
                r.subtotal_cost.to_string(),
            ]
        })
        .collect();
    print_table(&["ROLE", "HOURS", "RATE", "SUBTOTAL"], role_rows);
    println!();

    println!(
        "Total: {} {} for {} hours",
        report.aggregates.total_cost,
        report.currency,
        hours(report.aggregates.total_hours)
    );
    let basis = if report.duration.from_hours {
        "from total hours"
    } else {
        "critical path"
    };
    println!(
        "Duration: {} weeks ({basis}); advisory {}-{} weeks",
        report.duration.resolved_weeks, report.duration.advisory.min, report.duration.advisory.max
    );
    println!(
        "Advisory range: {}-{} {}",
        report.advisory_cost.min, report.advisory_cost.max, report.currency
    );

    let overrides: Vec<String> = report
        .rates
        .iter()
        .filter_map(|r| match r.entry {
            RateEntry::Unset => None,
            RateEntry::Cleared => Some(format!("{} cleared", r.role)),
            RateEntry::Value(v) => Some(format!("{} @ {}", r.role, rate(v))),
        })
        .collect();
    if !overrides.is_empty() {
        println!("Rates: {}", overrides.join(", "));
    }

    for q in &report.quarantined {
        println!(
            "warning: task '{}' in '{}' uses unknown role '{}'",
            q.task, q.phase, q.label
        );
    }
}
