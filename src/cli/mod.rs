//! Laser Predictor CLI Module
//!
//! Command-line front end: single predictions, training reports, data source
//! inspection and an interactive prompt loop.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::config::PredictorConfig;
use crate::dataset::DatasetLoader;
use crate::inference::{shared_cache, FittedPipeline, InferenceEngine, InitPolicy, Prediction};
use crate::record::{RawValue, TreatmentRequest};
use crate::schema::{self, ColumnRole, SchemaMode};
use crate::units::{PowerMode, PowerSetting};
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn warn(s: &str) -> ColoredString   { s.truecolor(230, 190, 90) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_warn(msg: &str) {
    println!("  {} {}", warn("!"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "laser-predictor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Predict exposure time, relaxation time and energy for laser therapy sessions")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Training data file (CSV, TSV, JSON, NDJSON or Parquet)
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    /// Fail when a declared column is missing instead of using the available subset
    #[arg(long, global = true)]
    pub strict: bool,

    /// Trees per target
    #[arg(long, global = true)]
    pub trees: Option<usize>,

    /// Random seed for the forests
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Configuration file (or defaults) with command-line overrides applied
    pub fn resolve_config(&self) -> anyhow::Result<PredictorConfig> {
        let mut config = match &self.config {
            Some(path) => PredictorConfig::load(path)?,
            None => PredictorConfig::default(),
        };
        if let Some(ref data) = self.data {
            config.data_path = Some(data.clone());
        }
        if self.strict {
            config.schema_mode = SchemaMode::Strict;
        }
        if let Some(trees) = self.trees {
            config.forest.n_estimators = trees;
        }
        if let Some(seed) = self.seed {
            config.forest.random_state = seed;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict treatment parameters for one patient
    Predict(PredictArgs),

    /// Fit the model and report schema, fit quality and feature importances
    Train {
        /// Importances listed per target
        #[arg(long, default_value = "5")]
        top: usize,
    },

    /// Show the data source's columns and which declared columns it provides
    Info,

    /// Prompt for treatments until exit (default)
    Interactive,
}

/// Feature values for one prediction; omitted features take the training
/// mean (numeric) or most frequent value (categorical)
#[derive(Args, Debug, Default)]
pub struct PredictArgs {
    #[arg(long)]
    pub age: Option<f64>,

    /// Sessions per week
    #[arg(long)]
    pub frequency: Option<f64>,

    #[arg(long)]
    pub depth: Option<f64>,

    /// Laser radius in cm
    #[arg(long)]
    pub radius: Option<f64>,

    /// Power in milliwatts
    #[arg(long, conflicts_with = "power_w")]
    pub power_mw: Option<f64>,

    /// Power in watts, clamped to the power mode's range
    #[arg(long)]
    pub power_w: Option<f64>,

    /// Power range for --power-w (high: 0.5-30 W, low: 0.005-0.5 W)
    #[arg(long, default_value = "high")]
    pub power_mode: PowerMode,

    /// Low-Level or High-Level
    #[arg(long)]
    pub intensity: Option<String>,

    /// CW or PW
    #[arg(long)]
    pub laser_type: Option<String>,

    /// Print the prediction as JSON
    #[arg(long)]
    pub json: bool,
}

impl PredictArgs {
    /// Explicit values only; returns the request and any clamping notice
    pub fn to_request(&self) -> anyhow::Result<(TreatmentRequest, Option<String>)> {
        let mut request = TreatmentRequest::new();
        let mut notice = None;

        let numeric = [
            (schema::AGE, self.age),
            (schema::FREQUENCY, self.frequency),
            (schema::PENETRATION_DEPTH, self.depth),
            (schema::LASER_RADIUS, self.radius),
            (schema::POWER_MW, self.power_mw),
        ];
        for (name, value) in numeric {
            if let Some(v) = value {
                request.set(name, v);
            }
        }

        if let Some(watts) = self.power_w {
            let mut setting = PowerSetting::new(self.power_mode);
            let stored = setting.set_watts(watts)?;
            if stored != watts {
                let bounds = setting.bounds();
                notice = Some(format!(
                    "{} W is outside the {} range [{}, {}], using {} W",
                    watts, self.power_mode, bounds.min, bounds.max, stored
                ));
            }
            request.set(schema::POWER_MW, setting.milliwatts());
        }

        if let Some(ref intensity) = self.intensity {
            request.set(schema::INTENSITY, intensity.as_str());
        }
        if let Some(ref laser_type) = self.laser_type {
            request.set(schema::LASER_TYPE, laser_type.as_str());
        }

        Ok((request, notice))
    }
}

// ─── Shared pieces ─────────────────────────────────────────────────────────────

fn build_engine(config: &PredictorConfig) -> InferenceEngine {
    InferenceEngine::new(config.inference.clone(), shared_cache(config))
}

fn fit_with_progress(engine: &InferenceEngine) -> anyhow::Result<Arc<FittedPipeline>> {
    step_run("Fitting model");
    let start = Instant::now();
    let pipeline = engine.initialize()?;
    step_done(&format!(
        "{} rows, {} targets in {:.2?}",
        pipeline.training_rows(),
        pipeline.schema().n_targets(),
        start.elapsed()
    ));
    Ok(pipeline)
}

/// Fill features the request lacks from the training means and modes
fn complete_request(pipeline: &FittedPipeline, request: &mut TreatmentRequest) -> Vec<String> {
    let mut defaulted = Vec::new();
    for (name, value) in pipeline.typical_request().iter() {
        if !request.contains(name) {
            request.set(name.clone(), value.clone());
            defaulted.push(name.clone());
        }
    }
    defaulted
}

fn print_request(request: &TreatmentRequest, defaulted: &[String]) {
    section("Inputs");
    for (name, value) in request.iter() {
        let shown = match value {
            RawValue::Number(v) => format!("{:.3}", v),
            other => other.to_string(),
        };
        let marker = if defaulted.contains(name) { dim(" (training average)") } else { "".normal() };
        println!("  {:<28} {}{}", muted(name), shown.white(), marker);
    }
}

fn print_prediction(prediction: &Prediction) {
    section("Predicted parameters");
    for (target, value) in prediction.iter() {
        println!("  {:<28} {}", muted(target), format!("{:.2}", value).white().bold());
    }
    println!();
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_predict(config: &PredictorConfig, args: &PredictArgs) -> anyhow::Result<()> {
    let (mut request, notice) = args.to_request()?;

    let engine = build_engine(config);
    if !args.json {
        section("Predict");
        if let Some(ref notice) = notice {
            step_warn(notice);
        }
    }

    let pipeline = if args.json { engine.initialize()? } else { fit_with_progress(&engine)? };
    let defaulted = complete_request(&pipeline, &mut request);
    let prediction = engine.predict(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        print_request(&request, &defaulted);
        print_prediction(&prediction);
    }

    Ok(())
}

pub fn cmd_train(config: &PredictorConfig, top: usize) -> anyhow::Result<()> {
    section("Train");

    let path = config
        .data_path
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no training data path configured"))?;

    step_run(&format!("Loading {}", path.display()));
    let start = Instant::now();
    let dataset = DatasetLoader::new(config.schema.clone(), config.schema_mode).load(path)?;
    step_done(&format!(
        "{} rows, {} dropped for nulls in {:.2?}",
        dataset.n_rows(),
        dataset.dropped_rows(),
        start.elapsed()
    ));

    let resolved = dataset.schema();
    for missing in resolved.missing_features.iter().chain(&resolved.missing_targets) {
        step_warn(&format!("declared column '{}' is not in the data source", missing));
    }

    step_run(&format!("Fitting {} trees per target", config.forest.n_estimators));
    let start = Instant::now();
    let pipeline = FittedPipeline::fit(&dataset, &config.preprocessing, &config.forest)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    section("Schema");
    println!("  {}", kv(&format!("{:<12}", "Numeric"), &resolved.numeric_features.join(", ")));
    println!("  {}", kv(&format!("{:<12}", "Categorical"), &resolved.categorical_features.join(", ")));
    println!("  {}", kv(&format!("{:<12}", "Targets"), &resolved.targets.join(", ")));
    println!("  {}", kv(&format!("{:<12}", "Encoded"), &pipeline.preprocessor().n_features_out().to_string()));

    section("In-sample fit");
    println!("  {:<28} {:>10} {:>12}", muted("Target"), muted("R²"), muted("RMSE"));
    for (target, metrics) in pipeline.in_sample_metrics(&dataset)? {
        println!("  {:<28} {:>10.4} {:>12.4}", target, metrics.r2, metrics.rmse);
    }

    for target in &resolved.targets {
        if let Some(ranked) = pipeline.feature_importances(target) {
            section(&format!("Top features · {}", target));
            for (name, importance) in ranked.iter().take(top) {
                println!("  {:<28} {:>8.4}", muted(name), importance);
            }
        }
    }

    println!();
    step_ok("model ready");
    println!();
    Ok(())
}

pub fn cmd_info(config: &PredictorConfig) -> anyhow::Result<()> {
    section("Data Info");

    let path = config
        .data_path
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no training data path configured"))?;

    let loader = DataLoader::new();
    let info = loader.get_file_info(path)?;
    let df = loader.load_auto(path)?;

    println!("  {:<12} {}", muted("File"), info.path);
    println!("  {:<12} {:?}", muted("Format"), info.format);
    println!("  {:<12} {:.1} KB", muted("Size"), info.file_size as f64 / 1024.0);
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!("  {:<28} {:<12} {:<12} {:>6}", muted("Column"), muted("Type"), muted("Role"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(62)));

    for col in df.get_columns() {
        let role = match config.schema.role_of(col.name()) {
            Some(ColumnRole::Numeric) => accent("numeric"),
            Some(ColumnRole::Categorical) => accent("categorical"),
            Some(ColumnRole::Target) => ok("target"),
            None => dim("ignored"),
        };
        println!(
            "  {:<28} {:<12} {:<12} {:>6}",
            col.name().as_str(),
            format!("{}", col.dtype()).truecolor(140, 140, 140),
            role,
            col.null_count()
        );
    }

    let present: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    let declared = config.schema.features.iter().chain(&config.schema.targets);
    let missing: Vec<&String> = declared.filter(|c| !present.contains(c)).collect();

    println!();
    if missing.is_empty() {
        step_ok("all declared columns present");
    } else {
        for column in missing {
            step_warn(&format!("declared column '{}' is missing", column));
        }
    }

    println!();
    println!("  {}", muted("Preview"));
    println!("{}", df.head(Some(5)));
    println!();
    Ok(())
}

// ─── Interactive mode ──────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("       {}", "Laser Therapy Parameter Predictor".truecolor(120, 170, 255).bold());
    println!("       {}", dim(&format!("exposure · relaxation · energy  ·  v{}", env!("CARGO_PKG_VERSION"))));
    println!();
}

/// Collect one treatment field by field, starting from the training averages
fn prompt_treatment(
    theme: &dialoguer::theme::ColorfulTheme,
    pipeline: &FittedPipeline,
) -> anyhow::Result<TreatmentRequest> {
    use dialoguer::{Input, Select};

    let typical = pipeline.typical_request();
    let mut request = TreatmentRequest::new();
    let resolved = pipeline.schema();

    for name in &resolved.numeric_features {
        if name == schema::POWER_MW {
            continue;
        }
        let default = match typical.get(name) {
            Some(RawValue::Number(v)) => (v * 100.0).round() / 100.0,
            _ => 0.0,
        };
        let value: f64 = Input::with_theme(theme)
            .with_prompt(name.as_str())
            .default(default)
            .interact_text()?;
        request.set(name.as_str(), value);
    }

    if resolved.numeric_features.iter().any(|f| f == schema::POWER_MW) {
        let modes = ["High power (0.5-30 W)", "Low power (0.005-0.5 W)"];
        let mode = match Select::with_theme(theme)
            .with_prompt("Power mode")
            .items(&modes)
            .default(0)
            .interact()?
        {
            0 => PowerMode::High,
            _ => PowerMode::Low,
        };
        let mut setting = PowerSetting::new(mode);
        let bounds = setting.bounds();
        let watts: f64 = Input::with_theme(theme)
            .with_prompt(format!("Power (W) [{} - {}]", bounds.min, bounds.max))
            .default(setting.watts())
            .validate_with(move |w: &f64| {
                if bounds.contains(*w) {
                    Ok(())
                } else {
                    Err(format!("must be between {} and {} W", bounds.min, bounds.max))
                }
            })
            .interact_text()?;
        setting.set_watts(watts)?;
        request.set(schema::POWER_MW, setting.milliwatts());
    }

    for name in &resolved.categorical_features {
        let choices: Vec<String> = pipeline
            .preprocessor()
            .encoder()
            .and_then(|e| e.categories(name))
            .map(|c| c.to_vec())
            .unwrap_or_default();
        if choices.is_empty() {
            let value: String = Input::with_theme(theme).with_prompt(name.as_str()).interact_text()?;
            request.set(name.as_str(), value);
            continue;
        }
        let default = match typical.get(name) {
            Some(RawValue::Text(t)) => choices.iter().position(|c| c == t).unwrap_or(0),
            _ => 0,
        };
        let idx = Select::with_theme(theme)
            .with_prompt(name.as_str())
            .items(&choices)
            .default(default)
            .interact()?;
        request.set(name.as_str(), choices[idx].as_str());
    }

    Ok(request)
}

fn answer(engine: &InferenceEngine, request: &TreatmentRequest) {
    match engine.predict(request) {
        Ok(prediction) => print_prediction(&prediction),
        Err(e) if e.is_request_error() => {
            step_warn(&format!("{}", e));
            println!();
        }
        Err(e) => {
            println!("  {} {}", "error".red(), e);
            println!();
        }
    }
}

pub fn cmd_interactive(config: &PredictorConfig) -> anyhow::Result<()> {
    use dialoguer::{theme::ColorfulTheme, Input, Select};

    print_banner();

    let engine = build_engine(config);
    if config.inference.init_policy == InitPolicy::Eager {
        fit_with_progress(&engine)?;
    }

    let theme = ColorfulTheme {
        active_item_prefix: dialoguer::console::style("  ›".to_string()).for_stderr().cyan(),
        active_item_style: dialoguer::console::Style::new().for_stderr().white().bold(),
        inactive_item_prefix: dialoguer::console::style("   ".to_string()).for_stderr(),
        inactive_item_style: dialoguer::console::Style::new().for_stderr().color256(245),
        prompt_prefix: dialoguer::console::style("  ?".to_string()).for_stderr().color256(111),
        prompt_style: dialoguer::console::Style::new().for_stderr().white().bold(),
        ..ColorfulTheme::default()
    };

    loop {
        let items = &[
            "Predict               enter a treatment field by field",
            "Quick entry           key=value pairs separated by ;",
            "Typical patient       training averages and most common settings",
            "Exit",
        ];

        println!();
        let sel = Select::with_theme(&theme)
            .with_prompt("What would you like to do")
            .items(items)
            .default(0)
            .interact_opt()?;

        match sel {
            Some(0) => {
                let pipeline = match engine.cache().get() {
                    Some(p) => p,
                    None => fit_with_progress(&engine)?,
                };
                let request = prompt_treatment(&theme, &pipeline)?;
                answer(&engine, &request);
            }
            Some(1) => {
                let line: String = Input::with_theme(&theme)
                    .with_prompt("Record")
                    .interact_text()?;
                match TreatmentRequest::parse_pairs(&line) {
                    Ok(request) => answer(&engine, &request),
                    Err(e) => step_warn(&e.to_string()),
                }
            }
            Some(2) => {
                let pipeline = match engine.cache().get() {
                    Some(p) => p,
                    None => fit_with_progress(&engine)?,
                };
                let request = pipeline.typical_request();
                print_request(&request, &[]);
                answer(&engine, &request);
            }
            Some(3) | None => {
                println!();
                println!("  {}", dim("goodbye"));
                println!();
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from(["laser-predictor", "--strict", "--trees", "12", "--data", "x.csv", "info"]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.schema_mode, SchemaMode::Strict);
        assert_eq!(config.forest.n_estimators, 12);
        assert_eq!(config.data_path, Some(PathBuf::from("x.csv")));
        assert!(matches!(cli.command, Some(Commands::Info)));
    }

    #[test]
    fn test_power_watts_convert_and_clamp() {
        let args = PredictArgs {
            power_w: Some(0.9),
            power_mode: PowerMode::Low,
            laser_type: Some("CW".into()),
            ..Default::default()
        };
        let (request, notice) = args.to_request().unwrap();
        assert_eq!(request.get(schema::POWER_MW), Some(&RawValue::Number(500.0)));
        assert_eq!(request.get(schema::LASER_TYPE), Some(&RawValue::Text("CW".into())));
        assert!(notice.is_some());
        assert!(!request.contains(schema::AGE));
    }

    #[test]
    fn test_power_mw_passthrough() {
        let cli = Cli::parse_from(["laser-predictor", "predict", "--age", "60", "--power-mw", "400"]);
        let Some(Commands::Predict(args)) = cli.command else {
            panic!("expected predict");
        };
        let (request, notice) = args.to_request().unwrap();
        assert_eq!(request.get(schema::POWER_MW), Some(&RawValue::Number(400.0)));
        assert_eq!(request.get(schema::AGE), Some(&RawValue::Number(60.0)));
        assert!(notice.is_none());
    }
}
