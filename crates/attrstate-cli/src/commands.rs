use std::path::Path;

use anyhow::{bail, Context};
use attrstate_migrate::catalog::launch_configuration;
use attrstate_migrate::{
    extract_elements, MigrationOutcome, MigrationPlan, Migrator, SetRewriteStep, StepReport,
};
use attrstate_types::{CollectionPath, ElementFields, InstanceState};
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Migrate(args) => cmd_migrate(args, cli.format),
        Command::Elements(args) => cmd_elements(args, cli.format),
        Command::Hash(args) => cmd_hash(args, cli.format),
    }
}

fn load_state(path: &Path) -> anyhow::Result<InstanceState> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading state file {}", path.display()))?;
    let state = InstanceState::from_json(&data)
        .with_context(|| format!("parsing state file {}", path.display()))?;
    debug!(path = %path.display(), id = %state.id, version = state.schema_version, "loaded state");
    Ok(state)
}

fn load_migrator(source: &StepSource) -> anyhow::Result<Migrator> {
    if let Some(path) = &source.plan {
        let plan = MigrationPlan::from_path(path)?;
        return Ok(plan.into_migrator()?);
    }
    match source.builtin {
        Some(Builtin::LaunchConfiguration) => Ok(launch_configuration::migrator()?),
        None => bail!("either --plan or --builtin is required"),
    }
}

fn load_step(source: &StepSource, from: u32) -> anyhow::Result<SetRewriteStep> {
    if let Some(path) = &source.plan {
        let plan = MigrationPlan::from_path(path)?;
        let step = plan
            .step_for(from)
            .with_context(|| format!("plan {} has no step from v{from}", path.display()))?;
        return Ok(step.build());
    }
    match (source.builtin, from) {
        (Some(Builtin::LaunchConfiguration), 0) => Ok(launch_configuration::v0_to_v1()),
        (Some(Builtin::LaunchConfiguration), v) => bail!("launch-configuration has no step from v{v}"),
        (None, _) => bail!("either --plan or --builtin is required"),
    }
}

fn report_json(report: &StepReport) -> serde_json::Value {
    json!({
        "step": report.step,
        "collection": report.collection,
        "key_changes": report
            .key_changes
            .iter()
            .map(|(old, new)| json!({ "old": old, "new": new }))
            .collect::<Vec<_>>(),
        "keys_removed": report.summary.keys_removed,
        "keys_written": report.summary.keys_written,
    })
}

fn print_report(report: &StepReport) {
    println!("{} {}", "✓".green().bold(), report.step.bold());
    for (old, new) in &report.key_changes {
        if old == new {
            println!("  {}.{} {}", report.collection, old.yellow(), "(unchanged)".dimmed());
        } else {
            println!("  {}.{} -> {}", report.collection, old.yellow(), new.green());
        }
    }
}

fn nothing_to_migrate(version: u32) -> String {
    format!("Nothing to migrate (state is empty or already at v{version}).")
}

fn cmd_migrate(args: MigrateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let migrator = load_migrator(&args.source)?;
    let mut state = load_state(&args.state)?;
    let original = state.clone();

    let reports = if args.all {
        if let Some(from) = args.from {
            state.schema_version = from;
        }
        migrator.upgrade(Some(&mut state), &())?
    } else {
        let from = args.from.unwrap_or(state.schema_version);
        match migrator.migrate(from, Some(&mut state), &())? {
            MigrationOutcome::Migrated { report, .. } => vec![report],
            MigrationOutcome::Absent | MigrationOutcome::Unchanged => Vec::new(),
        }
    };

    match format {
        OutputFormat::Json if args.dry_run => {
            let value = json!({
                "from_version": original.schema_version,
                "to_version": state.schema_version,
                "steps": reports.iter().map(report_json).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            if reports.is_empty() {
                eprintln!("{}", nothing_to_migrate(state.schema_version));
            }
            for report in &reports {
                print_report(report);
            }
        }
        OutputFormat::Json => {}
    }

    if args.dry_run {
        return Ok(());
    }

    let output = state.to_json_pretty()?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, output).with_context(|| format!("writing {}", path.display()))?;
            if format == OutputFormat::Text {
                println!(
                    "Wrote v{} state to {}",
                    state.schema_version,
                    path.display().to_string().bold()
                );
            }
        }
        None if format == OutputFormat::Json || reports.is_empty() => println!("{output}"),
        None => println!("\n{output}"),
    }
    Ok(())
}

fn cmd_elements(args: ElementsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let state = load_state(&args.state)?;
    let collection = CollectionPath::new(args.collection);
    let elements = extract_elements(&state.attributes, &collection)?;

    match format {
        OutputFormat::Json => {
            let value: serde_json::Map<String, serde_json::Value> = elements
                .iter()
                .map(|(key, fields)| (key.to_string(), json!(fields)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            if elements.is_empty() {
                println!("No elements in {}.", collection.name().bold());
            }
            for (key, fields) in &elements {
                println!("{}.{}", collection, key.to_string().yellow().bold());
                for (name, value) in fields {
                    println!("  {name} = {value:?}");
                }
            }
        }
    }
    Ok(())
}

fn cmd_hash(args: HashArgs, format: OutputFormat) -> anyhow::Result<()> {
    let step = load_step(&args.source, args.from)?;
    let mut fields: ElementFields = args.fields.into_iter().collect();
    let key = step.rekey("<cli>", &mut fields)?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "collection": step.collection().name(),
                "scheme": step.hasher().scheme(),
                "key": key.as_str(),
            }))?
        ),
        OutputFormat::Text => println!("{}.{}", step.collection(), key.to_string().green().bold()),
    }
    Ok(())
}
