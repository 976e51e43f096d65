//! Plan-delete command - show what a cleanup would remove.

use std::collections::BTreeMap;
use std::path::PathBuf;

use colored::Colorize;
use setaudit::{CategoryRoles, DeletePlanner, ElementId, MemoryModel, ModelHost};

use super::load_config;

pub fn run(
    model_path: PathBuf,
    config_path: Option<PathBuf>,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let model = MemoryModel::load(&model_path)?;
    let config = load_config(config_path)?;

    let roles = CategoryRoles::classify(&model.categories(), &config.categories);
    let plan = DeletePlanner::new(&config.cleanup).build(&model, &roles);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Delete plan for".cyan().bold(),
        model_path.display().to_string().white()
    );
    println!();
    println!("  Priority: {}", plan.priority_uids.len().to_string().yellow());
    println!("  Other:    {}", plan.other_uids.len().to_string().white());
    println!(
        "  Kept:     {}",
        (model.element_count() - plan.len()).to_string().green()
    );

    // Per-category counts
    let by_category = |ids: &std::collections::BTreeSet<ElementId>| {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for id in ids {
            if let Some(element) = model.element(id) {
                *counts
                    .entry(roles.category_name(&element.category).to_string())
                    .or_insert(0) += 1;
            }
        }
        counts
    };

    for (label, tier) in [("Priority", &plan.priority_uids), ("Other", &plan.other_uids)] {
        if tier.is_empty() {
            continue;
        }
        println!();
        println!("{}", format!("{}:", label).yellow().bold());
        for (category, count) in by_category(tier) {
            println!("  {} ({})", category, count);
        }
        if verbose {
            for id in tier {
                println!("    {}", id.to_string().dimmed());
            }
        }
    }

    Ok(())
}
