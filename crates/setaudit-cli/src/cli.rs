//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Setaudit: selection-set audit, curation and cleanup
#[derive(Parser)]
#[command(name = "setaudit")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute a curate plan for the model's selection sets
    Audit {
        /// Path to the model snapshot (JSON)
        #[arg(value_name = "MODEL")]
        model: PathBuf,

        /// Restrict to these sets (by name or id); may be repeated
        #[arg(short, long = "set", value_name = "NAME")]
        sets: Vec<String>,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Save the plan to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a saved curate plan to the model
    Apply {
        /// Path to the model snapshot (JSON)
        #[arg(value_name = "MODEL")]
        model: PathBuf,

        /// Path to the curate plan
        #[arg(value_name = "PLAN")]
        plan: PathBuf,

        /// Leave ambiguous sets untouched
        #[arg(long)]
        skip_ambiguous: bool,

        /// Reconcile the plan with the model afterwards and save it back
        #[arg(long)]
        reconcile: bool,

        /// Write the updated model here (default: overwrite MODEL)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show which elements a cleanup would delete
    PlanDelete {
        /// Path to the model snapshot (JSON)
        #[arg(value_name = "MODEL")]
        model: PathBuf,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write one cleaned copy of the model per selection set
    Cleanup {
        /// Path to the model snapshot (JSON)
        #[arg(value_name = "MODEL")]
        model: PathBuf,

        /// Only these sets (by name or id); may be repeated
        #[arg(short, long = "set", value_name = "NAME")]
        sets: Vec<String>,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for the cleaned models
        #[arg(long, default_value = "cleanup")]
        out_dir: PathBuf,

        /// Do not dismiss host warnings during deletion
        #[arg(long)]
        keep_warnings: bool,
    },
}
