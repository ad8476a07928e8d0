use crate::cmd::parse_rate_arg;
use crate::context::{today_or, Context};
use crate::output::{hours, print_json};
use anyhow::{anyhow, Context as _};
use clap::{ArgGroup, Args};
use scopecast_ai::EstimatorClient;
use scopecast_core::io::atomic_write;
use scopecast_core::request::AnalyzeRequest;
use scopecast_core::session::Workspace;
use scopecast_core::types::RoleRate;
use std::path::PathBuf;

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["description", "description_file"])))]
pub struct AnalyzeArgs {
    /// Project name
    #[arg(long)]
    pub name: String,

    /// Free-text requirements
    #[arg(long)]
    pub description: Option<String>,

    /// Read the requirements from a file
    #[arg(long, value_name = "FILE")]
    pub description_file: Option<PathBuf>,

    /// Project type (e.g. "Web application")
    #[arg(long = "type", value_name = "TYPE")]
    pub project_type: Option<String>,

    /// Currency code (default: estimate.currency from config)
    #[arg(long)]
    pub currency: Option<String>,

    /// Hourly rate to quote for a role, repeatable (default: the roster's
    /// suggested rates)
    #[arg(long = "rate", value_name = "ROLE=RATE", value_parser = parse_rate_arg)]
    pub rates: Vec<(String, String)>,

    /// Write the estimate document to FILE
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

pub fn run(ctx: &Context, args: AnalyzeArgs, json: bool) -> anyhow::Result<()> {
    let request = build_request(ctx, &args)?;
    request.validate(ctx.config.estimate.min_description_chars)?;

    let client = EstimatorClient::from_config(&ctx.config)?;
    if !client.has_api_key() {
        // Fail before spinning up a runtime; same message the client would give.
        return Err(anyhow!(scopecast_ai::AiError::NoApiKey {
            env: ctx.config.ai.api_key_env.clone(),
        }));
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let ingested = rt.block_on(client.estimate(&request, &ctx.config))?;

    if let Some(out) = &args.out {
        let data = ingested.document.to_json_pretty()?;
        atomic_write(out, data.as_bytes())
            .with_context(|| format!("failed to write {}", out.display()))?;
        tracing::info!(path = %out.display(), "estimate saved");
    }

    if json {
        return print_json(&ingested.document);
    }

    let workspace = Workspace::new(ingested);
    let report = workspace.report(today_or(None));
    println!("{}", report.project_name);
    println!(
        "  Total:    {} {} over {} hours",
        report.aggregates.total_cost,
        report.currency,
        hours(report.aggregates.total_hours)
    );
    println!(
        "  Duration: {} weeks (advisory {}-{})",
        report.duration.resolved_weeks, report.duration.advisory.min, report.duration.advisory.max
    );
    println!("  Phases:   {}", report.aggregates.phases.len());
    for q in &report.quarantined {
        println!(
            "  warning: task '{}' in '{}' uses unknown role '{}'",
            q.task, q.phase, q.label
        );
    }
    match &args.out {
        Some(out) => println!("\nSaved to {}", out.display()),
        None => println!("\nRe-run with --out FILE to keep this estimate."),
    }
    Ok(())
}

fn build_request(ctx: &Context, args: &AnalyzeArgs) -> anyhow::Result<AnalyzeRequest> {
    let description = match (&args.description, &args.description_file) {
        (Some(d), _) => d.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => String::new(),
    };

    if args.rates.is_empty() {
        return Ok(request_from(ctx, args, description, suggested_rates(ctx)));
    }

    let mut role_rates = Vec::with_capacity(args.rates.len());
    for (role, raw) in &args.rates {
        let hourly_rate: f64 = raw
            .parse()
            .map_err(|_| anyhow!("invalid rate for '{role}': '{raw}'"))?;
        role_rates.push(RoleRate {
            role: role.clone(),
            hourly_rate,
        });
    }

    Ok(request_from(ctx, args, description, role_rates))
}

fn request_from(
    ctx: &Context,
    args: &AnalyzeArgs,
    description: String,
    role_rates: Vec<RoleRate>,
) -> AnalyzeRequest {
    AnalyzeRequest {
        project_name: args.name.clone(),
        project_type: args.project_type.clone(),
        description,
        currency: args
            .currency
            .clone()
            .unwrap_or_else(|| ctx.config.estimate.currency.clone()),
        role_rates,
    }
}

/// Roster roles that carry a suggested rate, in roster order.
fn suggested_rates(ctx: &Context) -> Vec<RoleRate> {
    ctx.config
        .roles
        .roles()
        .iter()
        .filter_map(|def| {
            def.default_rate.map(|hourly_rate| RoleRate {
                role: def.name.clone(),
                hourly_rate,
            })
        })
        .collect()
}
