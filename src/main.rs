//! prom-relabel - Prometheus-style metric relabeling
//!
//! Reads exposition text from a file or stdin, relabels every sample with
//! the configured rules and prints the samples that survive.

use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use prom_relabel::cli::{Cli, OutputFormat};
use prom_relabel::config::Config;
use prom_relabel::exposition::{parse_exposition, PrometheusFormatter};
use prom_relabel::relabel::{Metric, RelabelEngine, Relabeled};

fn main() -> Result<()> {
    let cli = Cli::parse();

    prom_relabel::init_logging(&cli.log_level.to_string())?;

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let engine = config.build_engine()?;

    if cli.validate {
        return print_validation(&engine, cli.output_format);
    }
    if cli.dry_run {
        return print_rules(&engine, cli.output_format);
    }

    let input = read_input(&cli)?;
    let metrics = parse_exposition(&input)?;
    let total = metrics.len();

    let mut kept: Vec<Metric> = Vec::with_capacity(total);
    for metric in metrics {
        if let Relabeled::Kept(metric) = engine.relabel(metric)? {
            kept.push(metric);
        }
    }

    info!(
        total,
        kept = kept.len(),
        dropped = total - kept.len(),
        "Relabeling complete"
    );

    let formatter = PrometheusFormatter::new().with_timestamps(!cli.no_timestamps);
    print!("{}", formatter.format(&kept));

    Ok(())
}

fn read_input(cli: &Cli) -> Result<String> {
    match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn print_validation(engine: &RelabelEngine, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!(
            "Configuration is valid: {} rules, {} patterns",
            engine.len(),
            engine.cache().len()
        ),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "valid": true,
                "rules": engine.len(),
                "patterns": engine.cache().len(),
            })
        ),
        OutputFormat::Yaml => {
            print!("valid: true\nrules: {}\npatterns: {}\n", engine.len(), engine.cache().len())
        }
    }
    Ok(())
}

fn print_rules(engine: &RelabelEngine, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{} relabel rules:", engine.len());
            for (index, rule) in engine.rules().iter().enumerate() {
                println!("  [{}] {}", index, rule);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(engine.rules())?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(engine.rules())?),
    }
    Ok(())
}
