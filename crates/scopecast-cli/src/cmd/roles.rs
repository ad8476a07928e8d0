use crate::context::Context;
use crate::output::{print_json, print_table, rate};

pub fn run(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let roster = &ctx.config.roles;
    if json {
        return print_json(roster);
    }

    if roster.is_empty() {
        println!("No roles configured.");
        return Ok(());
    }

    let rows = roster
        .roles()
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.default_rate.map(rate).unwrap_or_else(|| "-".to_string()),
                r.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ROLE", "DEFAULT RATE", "DESCRIPTION"], rows);
    Ok(())
}
