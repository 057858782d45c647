//! Command-line interface: serve the web form, run one explanation, rebuild
//! the background sample, inspect artifacts.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::artifacts::{load_artifacts, Artifacts};
use crate::background::{BackgroundSampler, HistoricalDataset};
use crate::config::AppConfig;
use crate::pipeline::ExplainContext;
use crate::preprocessing::FeatureTransform;
use crate::record::ApplicantRecord;
use crate::report::{format_percent, render_report_text};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
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
#[command(name = "loan-risk-explainer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Loan default risk prediction with feature-attribution explanations")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Server port [default: $API_PORT or 8080]
        #[arg(short, long)]
        port: Option<u16>,

        /// Server host [default: $API_HOST or 0.0.0.0]
        #[arg(long)]
        host: Option<String>,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Assess one applicant and print the report
    Explain {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Applicant record (JSON); the form defaults are used when omitted
        #[arg(short, long)]
        record: Option<PathBuf>,

        /// Print the full assessment as JSON instead of the text report
        #[arg(long)]
        json: bool,
    },

    /// Rebuild the background sample from the historical dataset
    BuildBackground {
        /// Historical dataset (CSV with a BAD column)
        #[arg(short, long)]
        data: PathBuf,

        /// Output file for the background sample (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Load and cross-check the artifacts, then print a summary
    Inspect {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

// ─── Shared loading ────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    Ok(AppConfig::load(path)?)
}

fn build_context(config: &AppConfig, artifacts: Artifacts) -> anyhow::Result<ExplainContext> {
    Ok(ExplainContext::new(
        artifacts,
        config.explainer.clone(),
        config.policy.clone(),
    )?)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let server_config = ServerConfig::with_overrides(host, port);
    let (host, port) = (server_config.host.clone(), server_config.port);
    let config = load_config(config_path)?;

    section("Startup");
    step_run("Loading artifacts");
    let start = Instant::now();
    let artifacts = load_artifacts(&config.artifacts, &config.sampler)?;
    step_done(&format!("{:?}", start.elapsed()));

    step_run("Preparing explainer");
    let start = Instant::now();
    let context = build_context(&config, artifacts)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Loan Risk Explainer".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Web form", &format!("http://{}:{}", host, port)));
    line_box(&kv("API     ", &format!("http://{}:{}/api/predict", host, port)));
    line_box(&kv("Health  ", &format!("http://{}:{}/api/health", host, port)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(server_config, context).await
}

pub fn cmd_explain(
    config_path: Option<&Path>,
    record_path: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let record = match record_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str::<ApplicantRecord>(&text)?
        }
        None => ApplicantRecord::default(),
    };

    let artifacts = load_artifacts(&config.artifacts, &config.sampler)?;
    let context = build_context(&config, artifacts)?;
    let assessment = context.assess(&record)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
        return Ok(());
    }

    section("Assessment");
    println!(
        "  {:<16} {}",
        muted("Probability"),
        format_percent(assessment.probability).white().bold()
    );
    println!("  {:<16} {}", muted("Confidence"), format_percent(assessment.confidence).white());
    println!("  {:<16} {}", muted("Band"), assessment.band.to_string().white());
    println!("  {:<16} {}", muted("Time"), format!("{:.1}ms", assessment.elapsed_ms).white());
    println!();
    println!("{}", render_report_text(&assessment));
    Ok(())
}

pub fn cmd_build_background(
    data_path: &Path,
    output_path: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    section("Build background sample");

    step_run("Loading preprocessing transform");
    let transform = FeatureTransform::load(&config.artifacts.transform)?;
    step_done(&format!("{} output features", transform.output_width()));

    step_run("Loading historical data");
    let start = Instant::now();
    let dataset = HistoricalDataset::load_csv(data_path)?;
    step_done(&format!("{} rows in {:?}", dataset.len(), start.elapsed()));

    step_run("Splitting and balancing");
    let start = Instant::now();
    let sampler = BackgroundSampler::new(config.sampler.clone());
    let sample = sampler.sample(&dataset, &transform)?;
    step_done(&format!("{} rows in {:?}", sample.len(), start.elapsed()));

    sample.save(output_path)?;
    println!();
    println!("  {} {}", ok("✓"), format!("Saved to {}", output_path.display()).white());
    println!();
    Ok(())
}

pub fn cmd_inspect(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    section("Inspect artifacts");

    step_run("Loading artifacts");
    let start = Instant::now();
    let artifacts = load_artifacts(&config.artifacts, &config.sampler)?;
    step_done(&format!("{:?}", start.elapsed()));

    let model = artifacts.model.describe();
    let width = artifacts.transform.output_width();
    let names = artifacts.feature_names.clone();
    let background_rows = artifacts.background.len();
    let context = build_context(&config, artifacts)?;
    let explainer = context.explainer();

    println!();
    println!("  {:<18} {}", muted("Model"), model.white());
    println!("  {:<18} {}", muted("Features"), width.to_string().white());
    println!("  {:<18} {}", muted("Background rows"), background_rows.to_string().white());
    println!("  {:<18} {}", muted("Base value"), format!("{:.4}", explainer.base_value()).white());
    println!("  {:<18} {}", muted("Rounds per row"), explainer.rounds().to_string().white());
    println!("  {:<18} {}", muted("Threshold"), format!("{}", context.policy().threshold).white());
    println!();
    for (i, name) in names.iter().enumerate() {
        println!("  {} {}", dim(&format!("{:>3}", i)), name);
    }
    println!();
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
    fn test_parse_build_background() {
        let cli = Cli::try_parse_from([
            "loan-risk-explainer",
            "build-background",
            "--data",
            "hmeq.csv",
            "--output",
            "background.json",
        ])
        .unwrap();
        match cli.command {
            Commands::BuildBackground { data, output, config } => {
                assert_eq!(data, PathBuf::from("hmeq.csv"));
                assert_eq!(output, PathBuf::from("background.json"));
                assert!(config.is_none());
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_serve_address_is_optional() {
        let cli = Cli::try_parse_from(["loan-risk-explainer", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { port, host, .. } => {
                assert!(port.is_none());
                assert!(host.is_none());
            }
            _ => panic!("wrong subcommand"),
        }

        let cli = Cli::try_parse_from(["loan-risk-explainer", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Commands::Serve { port, .. } => assert_eq!(port, Some(9000)),
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_strip_ansi() {
        let colored = format!("{}", "x".red());
        assert_eq!(strip_ansi(&colored).chars().count(), 1);
    }
}
