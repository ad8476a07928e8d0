use crate::context::{today_or, Context};
use crate::output::print_json;
use chrono::NaiveDate;
use clap::Args;
use scopecast_core::session::Workspace;
use scopecast_core::timeline::{PhaseBar, Timeline};
use std::path::PathBuf;

#[derive(Args)]
pub struct TimelineArgs {
    /// Saved estimate document (JSON)
    pub file: PathBuf,

    /// Date the timeline is anchored from (YYYY-MM-DD)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

pub fn run(ctx: &Context, args: TimelineArgs, json: bool) -> anyhow::Result<()> {
    let workspace = Workspace::new(ctx.read_estimate(&args.file)?);
    let report = workspace.report(today_or(args.today));
    let timeline = report.timeline;

    if json {
        return print_json(&timeline);
    }

    println!(
        "Starts {} ({} weeks)",
        timeline.anchor.format("%Y-%m-%d"),
        timeline.total_weeks
    );
    println!();
    for line in render(&timeline) {
        println!("{line}");
    }
    Ok(())
}

/// One character per week. Month header labels are clipped to the weeks
/// they span.
pub fn render(timeline: &Timeline) -> Vec<String> {
    let name_width = timeline
        .bars
        .iter()
        .map(|b| b.phase.chars().count())
        .max()
        .unwrap_or(0)
        .max(5);

    let mut lines = Vec::new();

    let mut header = " ".repeat(name_width + 2);
    for month in &timeline.months {
        let span = month.weeks.len();
        let mut label: String = month.label.chars().take(span.saturating_sub(1)).collect();
        label.insert(0, '|');
        let label: String = label.chars().take(span).collect();
        header.push_str(&format!("{label:<span$}"));
    }
    lines.push(header.trim_end().to_string());

    let mut legend = " ".repeat(name_width + 2);
    for month in &timeline.months {
        legend.push('|');
        legend.push_str(&"-".repeat(month.weeks.len().saturating_sub(1)));
    }
    lines.push(legend);

    for bar in &timeline.bars {
        lines.push(format!(
            "{:<name_width$}  {}  {}",
            bar.phase,
            bar_cells(bar, timeline.total_weeks),
            describe(bar)
        ));
    }

    if !timeline.months.is_empty() {
        lines.push(String::new());
        for month in &timeline.months {
            let first = month.weeks.first().copied().unwrap_or(0);
            let last = month.weeks.last().copied().unwrap_or(0);
            lines.push(format!("{:<16} weeks {first}-{last}", month.label));
        }
    }
    lines
}

fn bar_cells(bar: &PhaseBar, total_weeks: u32) -> String {
    (1..=total_weeks)
        .map(|w| {
            if w >= bar.span.start() && w <= bar.span.end() {
                '#'
            } else {
                '.'
            }
        })
        .collect()
}

fn describe(bar: &PhaseBar) -> String {
    let weeks = if bar.span.start() == bar.span.end() {
        format!("week {}", bar.span.start())
    } else {
        format!("weeks {}-{}", bar.span.start(), bar.span.end())
    };
    if bar.milestone.trim().is_empty() {
        weeks
    } else {
        format!("{weeks}: {}", bar.milestone.trim())
    }
}
