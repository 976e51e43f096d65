//! Audit command - compute a curate plan.

use std::path::PathBuf;

use colored::Colorize;
use setaudit::{CategoryRoles, CurationEngine, MemoryModel, ModelHost};
use tracing::warn;

use super::load_config;

pub fn run(
    model_path: PathBuf,
    sets: Vec<String>,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    json_output: bool,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let model = MemoryModel::load(&model_path)?;
    let config = load_config(config_path)?;

    let roles = CategoryRoles::classify(&model.categories(), &config.categories);
    if roles.used_fallback_seed {
        warn!(
            seed = roles.seed.len(),
            "no configured seed category survived the blacklist, using fallback seeds"
        );
    }

    let plan = CurationEngine::new(&roles, &config.curation).compute(&model, &sets);

    if let Some(ref path) = output {
        plan.save(path)?;
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Curate plan for".cyan().bold(),
        model_path.display().to_string().white()
    );
    println!();

    let summary = plan.summary();
    println!("{}", "Sets:".yellow().bold());
    println!("  Valid:     {}", summary.valid_sets.to_string().white());
    println!("  Changed:   {}", summary.changed_sets.to_string().green());
    println!("  Ambiguous: {}", summary.ambiguous_sets.to_string().red());
    if summary.ignored_sets > 0 {
        println!("  Ignored:   {}", summary.ignored_sets.to_string().dimmed());
    }
    println!();

    for delta in &plan.deltas {
        let name = if delta.was_ambiguous {
            format!("{} (ambiguous)", delta.set_name).red().bold()
        } else if delta.has_changes() {
            delta.set_name.green().bold()
        } else {
            delta.set_name.white()
        };
        println!("{}", name);

        for line in delta.details.lines() {
            if line.starts_with("  +") {
                println!("  {}", line.green());
            } else if line.starts_with("  -") {
                println!("  {}", line.red());
            } else {
                println!("  {}", line);
            }
        }
    }

    for name in &plan.ignored_set_names {
        println!("{} {}", name.dimmed(), "(no seed-category member, ignored)".dimmed());
    }

    if let Some(path) = output {
        println!();
        println!("Plan saved to {}", path.display().to_string().cyan());
    }

    Ok(())
}
