//! Apply command - write a saved curate plan back to the model.

use std::path::PathBuf;

use colored::Colorize;
use setaudit::curation::reconcile_with_model;
use setaudit::{CuratePlan, CurationApplier, MemoryModel, ModelHost};

pub fn run(
    model_path: PathBuf,
    plan_path: PathBuf,
    skip_ambiguous: bool,
    reconcile: bool,
    output: Option<PathBuf>,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut model = MemoryModel::load(&model_path)?;
    let plan = CuratePlan::load(&plan_path)?;

    if plan.document_id != model.document_id() {
        return Err(format!(
            "Plan was computed for document '{}', but the model is '{}'",
            plan.document_id,
            model.document_id()
        )
        .into());
    }

    let mut plan = if skip_ambiguous { plan.without_ambiguous() } else { plan };
    let summary = CurationApplier::new().apply(&mut model, &plan)?;

    for entry in &summary.entries {
        let marker = if entry.was_ambiguous { " (ambiguous)".red() } else { "".normal() };
        println!(
            "{}{}: {} -> {} ({}, {})",
            entry.set_name.white().bold(),
            marker,
            entry.before_count,
            entry.after_count,
            format!("+{}", entry.added).green(),
            format!("-{}", entry.removed).red()
        );
    }
    for skipped in &summary.skipped {
        println!("{} {}: {}", "skipped".yellow(), skipped.set_name, skipped.reason);
    }

    if summary.committed {
        println!("{} {} set(s) updated", "✓".green(), summary.changed_sets());
    } else {
        println!("{}", "No membership changes".dimmed());
    }

    if reconcile {
        let reports = reconcile_with_model(&mut plan, &model, true);
        for report in reports.iter().filter(|r| !r.is_clean()) {
            println!("{} {}: {}", "mismatch".red(), report.set_name, report.note());
        }
        plan.save(&plan_path)?;
    }

    let output = output.unwrap_or(model_path);
    model.save(&output)?;
    println!("Model written to {}", output.display().to_string().cyan());

    Ok(())
}
