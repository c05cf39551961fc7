//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging (stderr)
//! - loads the model registry once per invocation
//! - dispatches to the predictor and prints tables or JSON to stdout
//! - writes optional exports

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, BatchArgs, Cli, Command, HealthArgs, InfoArgs, PredictArgs, QuoteArgs};
use crate::domain::{
    Department, FeatureOverrides, HealthStatus, PredictConfig, PredictionResult, RawRecord,
};
use crate::error::{AppError, EXIT_IO, EXIT_UNAVAILABLE};
use crate::io::{AnalysisRequest, PredictionBatch};
use crate::models::ModelRegistry;
use crate::predict::BatchPredictor;
use crate::report::SweepSummary;

/// Environment variable consulted when `--model-dir` is not given.
pub const MODEL_DIR_ENV: &str = "XP_MODEL_DIR";
pub const DEFAULT_MODEL_DIR: &str = "Model";

/// Entry point for the `xp` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = PredictConfig {
        model_dir: resolve_model_dir(cli.model_dir.clone(), std::env::var(MODEL_DIR_ENV).ok()),
        quiet: cli.quiet,
    };
    init_logging(&config);

    info!(model_dir = %config.model_dir.display(), "loading model registry");
    let registry = ModelRegistry::load_dir(&config.model_dir);
    let predictor = BatchPredictor::new(&registry);
    let today = Local::now().date_naive();

    match cli.command {
        Command::Predict(args) => handle_predict(predictor, args, today),
        Command::Batch(args) => handle_batch(predictor, args, today),
        Command::Analyze(args) => handle_analyze(predictor, args, today),
        Command::Quote(args) => handle_quote(predictor, args),
        Command::Info(args) => handle_info(predictor, args),
        Command::Health(args) => handle_health(&registry, &config, args),
    }
}

fn init_logging(config: &PredictConfig) {
    let default = if config.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

/// Flag, then environment, then `Model/`.
pub fn resolve_model_dir(flag: Option<PathBuf>, env: Option<String>) -> PathBuf {
    flag.or_else(|| env.filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR))
}

/// Turn `xp predict` arguments into a request record.
pub fn record_from_args(args: &PredictArgs, today: NaiveDate) -> Result<RawRecord, AppError> {
    let mut overrides = FeatureOverrides::default();
    for assignment in &args.overrides {
        overrides.apply_assignment(assignment)?;
    }
    let record = RawRecord {
        days_to_expiry: Some(args.days_to_expiry),
        dept_id: Some(args.dept_id.clone()),
        date: args.date.clone(),
        city: args.city.clone(),
        overrides,
    };
    Ok(record.or_date(today))
}

fn handle_predict(predictor: BatchPredictor<'_>, args: PredictArgs, today: NaiveDate) -> Result<(), AppError> {
    let record = record_from_args(&args, today)?;
    let result = predictor.predict_single(record)?;

    if args.json {
        print_json(&result)
    } else {
        print!("{}", crate::report::format_predictions(std::slice::from_ref(&result)));
        Ok(())
    }
}

fn handle_batch(predictor: BatchPredictor<'_>, args: BatchArgs, today: NaiveDate) -> Result<(), AppError> {
    let records = crate::io::load_batch(&args.input, today)?;
    let results = predictor.predict_records(&records)?;

    if args.json {
        print_json(&PredictionBatch::new(&results))?;
    } else {
        print!("{}", crate::report::format_predictions(&results));
    }

    if let Some(path) = &args.export {
        crate::io::write_results_csv(path, &results)?;
        info!(path = %path.display(), "wrote CSV export");
    }
    if let Some(path) = &args.export_json {
        crate::io::write_results_json(path, &results)?;
        info!(path = %path.display(), "wrote JSON export");
    }
    Ok(())
}

/// JSON shape of `xp analyze --json`.
#[derive(Debug, Serialize)]
struct SweepOutput<'a> {
    dept_id: Department,
    date: NaiveDate,
    max_days: u32,
    predictions: &'a [PredictionResult],
    summary: Option<SweepSummary>,
}

fn handle_analyze(predictor: BatchPredictor<'_>, args: AnalyzeArgs, today: NaiveDate) -> Result<(), AppError> {
    let request = AnalysisRequest {
        dept_id: Some(args.dept_id.clone()),
        date: args.date.clone(),
        max_days: Some(args.max_days),
    };
    let spec = crate::io::sweep_spec(&request, today)?;
    let results = predictor.analyze(spec.department, spec.date, spec.max_days)?;
    let summary = crate::report::summarize_sweep(&results);

    if args.json {
        return print_json(&SweepOutput {
            dept_id: spec.department,
            date: spec.date,
            max_days: spec.max_days,
            predictions: &results,
            summary,
        });
    }

    println!("=== {} expiry sweep from {} (1..={} days) ===", spec.department, spec.date, spec.max_days);
    print!("{}", crate::report::format_sweep_summary(summary.as_ref()));
    println!();
    print!("{}", crate::report::format_predictions(&results));
    if args.plot {
        println!();
        print!("{}", crate::plot::render_sweep_plot(&results, args.width, args.height));
    }
    Ok(())
}

fn handle_quote(predictor: BatchPredictor<'_>, args: QuoteArgs) -> Result<(), AppError> {
    let listing = crate::io::load_listing(&args.input)?;
    let quote = predictor.quote_listing(&listing)?;

    if args.json {
        print_json(&quote)
    } else {
        print!("{}", crate::report::format_quote(&quote));
        Ok(())
    }
}

fn handle_info(predictor: BatchPredictor<'_>, args: InfoArgs) -> Result<(), AppError> {
    let info = predictor.info();
    if args.json {
        print_json(&info)
    } else {
        print!("{}", crate::report::format_model_info(&info));
        Ok(())
    }
}

fn handle_health(registry: &ModelRegistry, config: &PredictConfig, args: HealthArgs) -> Result<(), AppError> {
    let report = registry.health();
    if args.json {
        print_json(&report)?;
    } else {
        print!("{}", crate::report::format_health(&report));
    }

    if args.strict && report.status == HealthStatus::Unavailable {
        return Err(AppError::new(
            EXIT_UNAVAILABLE,
            format!("No model bundles loaded from '{}'.", config.model_dir.display()),
        ));
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::new(EXIT_IO, format!("Failed to serialize output: {e}")))?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EXIT_INPUT;

    fn predict_args(overrides: &[&str]) -> PredictArgs {
        PredictArgs {
            days_to_expiry: 5,
            dept_id: "FOODS_1".into(),
            date: None,
            city: Some("CA_1".into()),
            overrides: overrides.iter().map(|s| s.to_string()).collect(),
            json: false,
        }
    }

    #[test]
    fn model_dir_precedence() {
        assert_eq!(
            resolve_model_dir(Some("flag".into()), Some("env".into())),
            PathBuf::from("flag")
        );
        assert_eq!(resolve_model_dir(None, Some("env".into())), PathBuf::from("env"));
        assert_eq!(resolve_model_dir(None, Some("  ".into())), PathBuf::from("Model"));
        assert_eq!(resolve_model_dir(None, None), PathBuf::from("Model"));
    }

    #[test]
    fn predict_args_become_a_dated_record() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let rec = record_from_args(&predict_args(&["promo_impact=0.25"]), today).unwrap();
        assert_eq!(rec.date.as_deref(), Some("2024-03-01"));
        assert_eq!(rec.overrides.promo_impact, 0.25);
        assert_eq!(rec.city.as_deref(), Some("CA_1"));
    }

    #[test]
    fn unknown_override_is_an_input_error() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let err = record_from_args(&predict_args(&["year=2024"]), today).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
    }

    #[test]
    fn strict_health_fails_only_when_nothing_loaded() {
        let config = PredictConfig {
            model_dir: PathBuf::from("missing-models"),
            quiet: true,
        };
        let strict = || HealthArgs {
            strict: true,
            json: false,
        };

        let err = handle_health(&ModelRegistry::empty(), &config, strict()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_UNAVAILABLE);
        assert!(err.to_string().contains("missing-models"), "{err}");

        let lenient = HealthArgs {
            strict: false,
            json: true,
        };
        assert!(handle_health(&ModelRegistry::empty(), &config, lenient).is_ok());

        let partial = crate::models::fixtures::registry_without(Department::Foods2);
        assert!(handle_health(&partial, &config, strict()).is_ok());
    }
}
