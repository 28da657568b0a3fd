use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use perf_baseline::audit::AuditResult;
use perf_baseline::compare::summarize;
use perf_baseline::config::{Config, ConfigOverrides};
use perf_baseline::engine::ReportEngine;
use perf_baseline::output::json::{render_json, ReportResponse};
use perf_baseline::output::table::{
    render_diff_table, render_outcome, render_overall_table, render_snapshot_table,
};
use perf_baseline::server::run_server;
use perf_baseline::snapshot::ReportStore;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "perf-baseline",
    about = "Store page performance audits and compare each run with the previous one"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short = 'd', long = "reports-dir")]
    reports_dir: Option<String>,
    #[arg(short, long, help = "Comma separated metric keys to track")]
    metrics: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Record an audit JSON file and compare it with the previous capture
    Ingest { file: PathBuf },
    /// Compare two reports given as stored keys or file paths
    Compare { from: String, to: String },
    /// List stored captures
    List,
    /// Print the tracked metrics of a stored capture
    Show { key: String },
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        reports_dir: cli.reports_dir.clone(),
        tracked: cli.metrics.as_deref().map(parse_metric_list).transpose()?,
    });

    if let Commands::Config { init, show } = &cli.command {
        return handle_config_command(*init, *show, &config, &config_path);
    }
    if let Commands::Serve { host, port } = &cli.command {
        let host = host.clone().unwrap_or_else(|| config.server.host.clone());
        let port = port.unwrap_or(config.server.port);
        let bind = format!("{host}:{port}");
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        return run_server(config, addr).await;
    }

    let store = ReportStore::new(config.resolved_reports_dir());
    let engine = ReportEngine::new(store, config.tracked_metrics());

    match &cli.command {
        Commands::Ingest { file } => {
            let audit = read_audit_file(file)?;
            let outcome = engine.run(audit)?;
            info!(location = %outcome.storage_location.display(), "capture recorded");
            match cli.output {
                OutputFormat::Table => println!("{}", render_outcome(&outcome)),
                OutputFormat::Json => {
                    println!("{}", render_json(&ReportResponse::from(outcome))?)
                }
            }
        }
        Commands::Compare { from, to } => {
            let previous = resolve_report(engine.store(), from)?;
            let current = resolve_report(engine.store(), to)?;
            let entries = engine.compare(&previous, &current)?;
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_diff_table(&entries));
                    for line in summarize(&entries) {
                        println!("{line}");
                    }
                }
                OutputFormat::Json => println!("{}", render_json(&entries)?),
            }
        }
        Commands::List => {
            let snapshots = engine.store().list_all()?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_snapshot_table(&snapshots)),
                OutputFormat::Json => println!("{}", render_json(&snapshots)?),
            }
        }
        Commands::Show { key } => {
            let report = resolve_report(engine.store(), key)?;
            let overall = perf_baseline::audit::extract_overall(&report, engine.metrics());
            match cli.output {
                OutputFormat::Table => println!("{}", render_overall_table(&overall)),
                OutputFormat::Json => println!("{}", render_json(&overall)?),
            }
        }
        Commands::Config { .. } => {}
        Commands::Serve { .. } => unreachable!("serve command handled before dispatch"),
    }

    Ok(())
}

fn handle_config_command(init: bool, show: bool, config: &Config, config_path: &Path) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn parse_metric_list(raw: &str) -> Result<Vec<String>> {
    let out = raw
        .split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if out.is_empty() {
        return Err(anyhow!("metric list is empty"));
    }
    Ok(out)
}

fn read_audit_file(path: &Path) -> Result<AuditResult> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading audit result: {}", path.display()))?;
    AuditResult::from_json(&data)
        .with_context(|| format!("failed parsing audit result: {}", path.display()))
}

fn resolve_report(store: &ReportStore, reference: &str) -> Result<AuditResult> {
    let as_path = Path::new(reference);
    if as_path.is_file() {
        return Ok(store.load(as_path)?);
    }
    store
        .load_key(reference)?
        .ok_or_else(|| anyhow!("no stored report or file named {reference}"))
}
