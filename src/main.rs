use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use headerguard::cli::{Cli, Commands, OutputFormat};
use headerguard::config::AppConfig;
use headerguard::engine::{Engine, ScanReport};
use headerguard::exchange;
use headerguard::sink::{AlertSink, JsonLinesSink};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { files, format } => cmd_scan(&cli.config, &files, format)?,
        Commands::Rules => cmd_rules(&cli.config)?,
        Commands::CheckConfig => cmd_check_config(&cli.config)?,
        Commands::Init => cmd_init(&cli.config)?,
    }

    Ok(())
}

/// Configuration at `path`, or the defaults when the file does not exist.
fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(AppConfig::default());
    }
    AppConfig::load_from_path(path)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn cmd_scan(config_path: &Path, files: &[PathBuf], format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let engine = Engine::from_config(&config)?;

    let mut exchanges = Vec::new();
    for file in files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let parsed = exchange::from_json(&text)
            .with_context(|| format!("failed to parse {}", file.display()))?;
        info!(file = %file.display(), exchanges = parsed.len(), "loaded capture");
        exchanges.extend(parsed);
    }

    let reports = engine.scan_batch(&exchanges);
    let failures: usize = reports.iter().map(|r| r.failures.len()).sum();

    match format {
        OutputFormat::Json => {
            let sink = JsonLinesSink::new(io::stdout());
            for alert in reports.iter().flat_map(|r| &r.alerts) {
                sink.push(alert)?;
            }
        }
        OutputFormat::Text => print_table(&reports),
    }

    if failures > 0 {
        warn!(failures, "some detectors failed; their findings are missing");
    }
    Ok(())
}

fn print_table(reports: &[ScanReport]) {
    let alerts: Vec<_> = reports.iter().flat_map(|r| &r.alerts).collect();
    if alerts.is_empty() {
        println!("No alerts.");
        return;
    }
    println!("{:<8} {:<6} {:<50} {}", "RISK", "RULE", "NAME", "URI");
    println!("{}", "─".repeat(100));
    for alert in alerts {
        println!(
            "{:<8} {:<6} {:<50} {}",
            alert.risk.to_string(),
            alert.rule_id,
            alert.name,
            alert.uri
        );
        if !alert.evidence.is_empty() {
            println!("         evidence: {}", alert.evidence);
        }
    }
}

fn cmd_rules(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let engine = Engine::from_config(&config)?;
    println!("{:<6} {:<22} {}", "ID", "KEY", "NAME");
    for detector in engine.registry().iter() {
        println!("{:<6} {:<22} {}", detector.id, detector.key, detector.name);
    }
    if !config.scan.disabled.is_empty() {
        println!("Disabled: {}", config.scan.disabled.join(", "));
    }
    Ok(())
}

fn cmd_check_config(config_path: &Path) -> anyhow::Result<()> {
    let config = AppConfig::load_from_path(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let ctx = config.build_context()?;
    println!("Config OK ({})", config_path.display());
    println!("  Threshold:               {:?}", ctx.threshold);
    println!("  Application error rules: {}", ctx.application_errors.len());
    println!("  Directory listing rules: {}", ctx.directory_listings.len());
    println!("  Known product versions:  {}", ctx.latest_versions.len());
    println!("  Disabled detectors:      {}", config.scan.disabled.len());
    Ok(())
}

fn cmd_init(config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() {
        println!("Config already exists: {}", config_path.display());
        return Ok(());
    }
    std::fs::write(config_path, include_str!("../templates/headerguard.toml"))?;
    println!("Created config: {}", config_path.display());
    Ok(())
}
