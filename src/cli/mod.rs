//! HST command-line interface
//!
//! One command: fit the HST model on a measurement file and write predictions
//! and residuals.

use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::pipeline::{HstPipeline, PipelineConfig, DEFAULT_OUTPUT};
use crate::training::FitConfig;
use crate::utils::LoaderConfig;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

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

#[derive(Parser, Debug)]
#[command(name = "hst")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fit an HST displacement model and write predictions and residuals")]
#[command(long_about = None)]
pub struct Cli {
    /// Input data file (delimited text with TIMESTAMP, temperature, ensoleillement, deplacement)
    pub input: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Field separator
    #[arg(long, default_value_t = ',')]
    pub separator: char,

    /// Lines to skip before the header row
    #[arg(long, default_value_t = 0)]
    pub skip_rows: usize,

    /// Relative pivot tolerance for rank detection
    #[arg(long, default_value_t = 1e-10)]
    pub rank_tolerance: f64,

    /// Also write the fitted coefficients and statistics as JSON
    #[arg(long)]
    pub model_json: Option<PathBuf>,

    /// Do not print the regression summary
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Build the pipeline configuration from the arguments
    pub fn to_config(&self) -> anyhow::Result<PipelineConfig> {
        if !self.separator.is_ascii() {
            anyhow::bail!("separator must be a single ASCII character, got '{}'", self.separator);
        }

        let loader = LoaderConfig::new()
            .with_separator(self.separator as u8)
            .with_skip_rows(self.skip_rows);
        let mut config = PipelineConfig::new()
            .with_loader(loader)
            .with_fit(FitConfig::new().with_rank_tolerance(self.rank_tolerance))
            .with_output(&self.output);
        if let Some(path) = &self.model_json {
            config = config.with_model_json(path);
        }
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.to_config()?;
    section("HST");

    step_run(&format!("Fitting {}", cli.input.display()));
    let start = Instant::now();
    let pipeline = HstPipeline::with_config(config);
    let output = pipeline.run_and_save(&cli.input).map_err(|e| {
        println!("{}", "failed".red());
        anyhow::anyhow!("{} stage failed: {}", e.stage(), e)
    })?;
    step_done(&format!(
        "{} rows in {:?}",
        output.series.len(),
        start.elapsed()
    ));

    if !cli.quiet {
        println!();
        println!("{}", output.model.summary);
    }

    println!();
    println!(
        "  {:<16} {}",
        muted("R²"),
        format!("{:.4}", output.model.summary.r_squared).white().bold()
    );
    println!(
        "  {:<16} {}",
        muted("Results"),
        pipeline.config().output_path.display().to_string().white()
    );
    if let Some(path) = &pipeline.config().model_json_path {
        println!("  {:<16} {}", muted("Model"), path.display().to_string().white());
    }
    println!();

    Ok(())
}
