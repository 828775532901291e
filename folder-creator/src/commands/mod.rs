use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use console::style;
use folder_creator_core::materialize::PlanStep;
use folder_creator_core::{BatchResult, DestinationStore, FolderCreator, Plan};
use serde_json::json;
use tracing::{info, warn};

use crate::cli::{Cli, OutputFormat};

/// How a run that passed its pre-checks ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// At least one folder could not be created.
    Failed,
}

impl RunStatus {
    pub fn exit_code(self) -> ExitCode {
        match self {
            RunStatus::Success => ExitCode::SUCCESS,
            RunStatus::Failed => ExitCode::from(1),
        }
    }
}

/// Resolves the destination, runs the batch and prints the summary.
///
/// Errors returned from here are pre-check failures: nothing was created.
pub async fn handle_create(cli: &Cli) -> Result<RunStatus> {
    let store = DestinationStore::new(&cli.remember_file);
    let destination = resolve_destination(cli.destination.as_deref(), &store).await?;
    info!(source = %cli.source.display(), destination = %destination.display(), "Starting batch");

    let creator = FolderCreator::new(&cli.creator_config());

    if cli.dry_run {
        let plan = creator
            .plan(&cli.source, &destination)
            .await
            .with_context(|| format!("Failed to plan folders from {}", cli.source.display()))?;
        print_plan(&plan, cli.format, cli.quiet)?;
        return Ok(RunStatus::Success);
    }

    let result = creator
        .create_folders(&cli.source, &destination)
        .await
        .with_context(|| format!("Failed to create folders from {}", cli.source.display()))?;

    if !cli.no_remember {
        remember(&store, &destination).await;
    }

    write_result(
        &result,
        cli.format,
        cli.quiet,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )?;
    Ok(if result.is_success() {
        RunStatus::Success
    } else {
        RunStatus::Failed
    })
}

async fn resolve_destination(flag: Option<&Path>, store: &DestinationStore) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }

    let remembered = match store.try_load().await {
        Ok(value) => value,
        Err(e) => {
            warn_user(&e.to_string());
            String::new()
        }
    };
    if remembered.trim().is_empty() {
        anyhow::bail!(
            "No destination given and none remembered in {}",
            store.path().display()
        );
    }
    info!(destination = %remembered, "Using remembered destination");
    Ok(PathBuf::from(remembered))
}

// A failed save is reported but never fails the run. The absolute path is
// stored so the next run finds it from any working directory.
async fn remember(store: &DestinationStore, destination: &Path) {
    let absolute = match tokio::fs::canonicalize(destination).await {
        Ok(path) => path,
        Err(e) => {
            warn_user(&format!(
                "Not remembering {}: {}",
                destination.display(),
                e
            ));
            return;
        }
    };
    let Some(value) = absolute.to_str() else {
        warn_user(&format!(
            "Not remembering {}: path is not valid UTF-8",
            absolute.display()
        ));
        return;
    };
    if let Err(e) = store.save(value).await {
        warn_user(&e.to_string());
    }
}

fn warn_user(message: &str) {
    warn!("{}", message);
    eprintln!("{} {}", style("warning:").yellow().bold(), message);
}

/// Writes the summary to `out` and one line per failed identifier to `err`,
/// whatever the format.
fn write_result(
    result: &BatchResult,
    format: OutputFormat,
    quiet: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<()> {
    for line in result.failure_lines() {
        writeln!(err, "{}", style(line).red().for_stderr())?;
    }
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&result.summary())
                .context("Failed to serialize batch summary")?;
            writeln!(out, "{text}")?;
        }
        OutputFormat::Text => {
            if !quiet {
                if result.is_success() {
                    writeln!(out, "{}", style(result.message()).green())?;
                }
                writeln!(
                    out,
                    "created {}, already existed {}, failed {}",
                    result.created().count(),
                    result.already_existed().count(),
                    result.failures().count()
                )?;
            }
        }
    }
    Ok(())
}

fn print_plan(plan: &Plan, format: OutputFormat, quiet: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = plan
                .entries()
                .iter()
                .map(|entry| {
                    let (action, reason) = step_label(&entry.step);
                    json!({
                        "identifier": entry.identifier,
                        "action": action,
                        "reason": reason,
                    })
                })
                .collect();
            let text = serde_json::to_string_pretty(&json!({
                "destination": plan.root(),
                "entries": entries,
            }))
            .context("Failed to serialize plan")?;
            println!("{text}");
        }
        OutputFormat::Text => {
            if quiet {
                return Ok(());
            }
            for entry in plan.entries() {
                let (action, reason) = step_label(&entry.step);
                match reason {
                    Some(reason) => println!("{:<8} {} ({})", action, entry.identifier, reason),
                    None => println!("{:<8} {}", action, entry.identifier),
                }
            }
            println!(
                "{} of {} folders would be created in {}",
                plan.to_create().count(),
                plan.entries().len(),
                plan.root().display()
            );
        }
    }
    Ok(())
}

fn step_label(step: &PlanStep) -> (&'static str, Option<String>) {
    match step {
        PlanStep::Create => ("create", None),
        PlanStep::Existing => ("exists", None),
        PlanStep::Duplicate => ("skip", Some("duplicate".to_string())),
        PlanStep::Reject(e) => ("reject", Some(e.to_string())),
    }
}
