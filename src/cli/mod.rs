//! Command-line parsing for the expiry price predictor.
//!
//! Argument parsing and command dispatch stay separate from feature
//! construction and inference. Department and date arguments are taken as
//! strings so they go through the same validation as JSON requests.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "xp", version, about = "Expiry-aware grocery price predictor")]
pub struct Cli {
    /// Directory holding `model_{DEPT}_optimized.json` / `scaler_{DEPT}_optimized.json`.
    ///
    /// Falls back to `XP_MODEL_DIR`, then `Model/`.
    #[arg(long, global = true, value_name = "PATH")]
    pub model_dir: Option<PathBuf>,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Price a single item.
    Predict(PredictArgs),
    /// Price every item in a JSON batch file (`{"items": [...]}`).
    Batch(BatchArgs),
    /// Sweep days-to-expiry 1..=N for one department and date.
    Analyze(AnalyzeArgs),
    /// Price a marketplace listing JSON file.
    Quote(QuoteArgs),
    /// Show which model bundles are loaded.
    Info(InfoArgs),
    /// Report registry health.
    Health(HealthArgs),
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Days until the item expires.
    #[arg(long = "days", allow_negative_numbers = true)]
    pub days_to_expiry: i64,

    /// Department code (FOODS_1, FOODS_2, FOODS_3).
    #[arg(long = "dept")]
    pub dept_id: String,

    /// Observation date (ISO-8601). Defaults to today.
    #[arg(long)]
    pub date: Option<String>,

    /// City id, echoed back in the result.
    #[arg(long)]
    pub city: Option<String>,

    /// Override an auxiliary signal, e.g. `--set promo_impact=0.2`. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Batch request JSON file.
    #[arg(long, value_name = "JSON")]
    pub input: PathBuf,

    /// Export per-row results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export per-row results to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[arg(long = "dept")]
    pub dept_id: String,

    /// Sweep date (ISO-8601). Defaults to today.
    #[arg(long)]
    pub date: Option<String>,

    #[arg(long, default_value_t = crate::predict::DEFAULT_SWEEP_DAYS)]
    pub max_days: u32,

    /// Render an ASCII plot of the sweep.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Listing JSON file (`categoryId`, `dateAdded`, `expiryDate`, ...).
    #[arg(long, value_name = "JSON")]
    pub input: PathBuf,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct HealthArgs {
    /// Exit non-zero when no model bundle is loaded.
    #[arg(long)]
    pub strict: bool,

    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_predict_with_overrides() {
        let cli = Cli::parse_from([
            "xp", "--model-dir", "m", "predict", "--days", "5", "--dept", "FOODS_1", "--set",
            "promo_impact=0.2", "--set", "has_event=1",
        ]);
        assert_eq!(cli.model_dir, Some(PathBuf::from("m")));
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.days_to_expiry, 5);
        assert_eq!(args.overrides, vec!["promo_impact=0.2", "has_event=1"]);
    }

    #[test]
    fn analyze_defaults_to_thirty_days() {
        let cli = Cli::parse_from(["xp", "analyze", "--dept", "FOODS_2", "--quiet"]);
        assert!(cli.quiet);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.max_days, 30);
        assert!(!args.plot);
    }

    #[test]
    fn negative_days_reach_validation() {
        let cli = Cli::parse_from(["xp", "predict", "--days", "-3", "--dept", "FOODS_1"]);
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.days_to_expiry, -3);
    }
}
