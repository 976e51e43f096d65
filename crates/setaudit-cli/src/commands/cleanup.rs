//! Cleanup command - one cleaned copy of the model per selection set.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use setaudit::{DeletionExecutor, ElementId, MemoryModel, ModelHost, SnapshotCache};
use tracing::{info, warn};

use super::load_config;

pub fn run(
    model_path: PathBuf,
    sets: Vec<String>,
    config_path: Option<PathBuf>,
    out_dir: PathBuf,
    keep_warnings: bool,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let model = MemoryModel::load(&model_path)?;
    let config = load_config(config_path)?;

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })?;

    let targets: Vec<_> = model
        .selection_sets()
        .into_iter()
        .filter(|s| sets.is_empty() || sets.iter().any(|k| k == s.id.as_str() || k == &s.name))
        .collect();
    if targets.is_empty() {
        return Err("No matching selection sets".into());
    }

    // Built once, resolved by stable id in every clone
    let mut cache = SnapshotCache::new();
    let roles = cache.roles(&model, &config.categories).clone();
    let plan = cache.delete_plan(&model, &roles, &config.cleanup);

    println!(
        "{} {} priority, {} other",
        "Delete plan:".cyan().bold(),
        plan.priority_uids.len(),
        plan.other_uids.len()
    );

    fs::create_dir_all(&out_dir)?;
    let executor = DeletionExecutor::new(&config.cleanup);

    let mut done = 0usize;
    let mut written = 0usize;
    for set in &targets {
        if cancelled.load(Ordering::SeqCst) {
            warn!(remaining = targets.len() - done, "cleanup cancelled");
            println!("{}", "Cancelled, remaining sets skipped".yellow());
            break;
        }

        let preserve: BTreeSet<ElementId> = model.members(&set.id).unwrap_or_default().into_iter().collect();
        let mut clone = model.clone();
        let report = executor.run(&mut clone, &preserve, plan, !keep_warnings)?;

        done += 1;
        if report.skipped_due_to_no_preserve {
            println!("{} {}: nothing to preserve", "skipped".yellow(), set.name);
            continue;
        }

        let path = out_dir.join(output_file_name(&set.name, set.id.as_str()));
        clone.save(&path)?;
        written += 1;
        info!(set = %set.name, path = %path.display(), "cleaned model written");

        let errors = if report.has_errors() {
            format!("{} errors", report.errors).red()
        } else {
            "no errors".green()
        };
        println!(
            "{}: kept {}, deleted {} ({} priority), {}",
            set.name.white().bold(),
            report.preserved_found,
            report.total_deleted(),
            report.priority_deleted,
            errors
        );
        if !report.first_error_message.is_empty() {
            println!("  {}", report.first_error_message.dimmed());
        }
        if report.failure_warnings_suppressed > 0 {
            println!(
                "  {} warning(s) dismissed",
                report.failure_warnings_suppressed.to_string().yellow()
            );
        }
    }

    println!();
    println!(
        "{} {} cleaned model(s) written to {}",
        "✓".green(),
        written,
        out_dir.display().to_string().cyan()
    );

    Ok(())
}

/// `<name>-<id>.json`. Sanitizing can map distinct names to one stem, the
/// set id keeps the files apart.
fn output_file_name(name: &str, id: &str) -> String {
    format!("{}-{}.json", sanitize(name), sanitize(id))
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
