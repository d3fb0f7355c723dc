//! Snapfit simulator - Main entry point
//!
//! Loads an assembly description and seats its plugs, either from a drag
//! script or with the automatic planner, then prints a report.

mod config;
mod planner;
mod report;
mod script;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use snapfit_core::AssemblyDescription;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "snapfit")]
#[command(about = "Headless plug and socket assembly simulator")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "snapfit.toml")]
    config: PathBuf,

    /// Assembly description, overrides the configured path
    #[arg(short, long)]
    assembly: Option<PathBuf>,

    /// Drag script to replay instead of the planner
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write the default configuration to --config and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout is reserved for the report
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Snapfit v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    let config = config::load_config(&args.config)?;
    let assembly_path = args
        .assembly
        .unwrap_or_else(|| PathBuf::from(&config.assembly.path));

    let description = AssemblyDescription::from_file(&assembly_path)
        .with_context(|| format!("loading assembly {}", assembly_path.display()))?;
    let assembly = description.build()?;
    info!(
        assembly = %assembly.name(),
        sockets = assembly.sockets().len(),
        plugs = assembly.plugs().len(),
        "Assembly loaded"
    );

    let mut session = session::Session::new(assembly, config.reveal.enabled);
    if config.simulation.activate_all {
        session.activate_all();
    }

    match &args.script {
        Some(path) => {
            let script = script::Script::from_file(path)
                .with_context(|| format!("loading script {}", path.display()))?;
            script::run_script(&mut session, &script)?;
        }
        None => {
            planner::run_planner(&mut session, &config.simulation);
        }
    }
    session.finish();

    let report = report::Report::from_session(&session);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }

    Ok(())
}
