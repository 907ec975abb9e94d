mod app;
mod backend;
mod config;
mod desktop;
mod document;
mod draft;
mod gate;
mod gateway;
mod model;
mod report;
mod status;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend::{Backend, ProcessBackend};
use crate::config::DeskConfig;
use crate::ui::DeskApp;

#[derive(Parser)]
#[command(name = "invoice-desk", version, about = "Desktop front-end for invoice generation")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend program, overriding the config file
    #[arg(long, global = true)]
    backend: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the desk window (default)
    Run,
    /// Write the effective configuration and print it
    Config,
    /// Print the invoice history
    History,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,invoice_desk={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn spawn_backend(config: &DeskConfig) -> anyhow::Result<ProcessBackend> {
    ProcessBackend::spawn(&config.backend.command, &config.backend.args)
        .with_context(|| format!("failed to start backend `{}`", config.backend.command))
}

fn run_desk(config: DeskConfig) -> anyhow::Result<()> {
    let backend: Arc<dyn Backend> = Arc::new(spawn_backend(&config)?);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Invoice Desk")
            .with_inner_size([980.0, 720.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Invoice Desk",
        options,
        Box::new(move |cc| Ok(Box::new(DeskApp::new(cc, &config, backend)))),
    )
    .map_err(|e| anyhow!("desk window failed: {e}"))
}

fn print_history(config: &DeskConfig) -> anyhow::Result<()> {
    let backend = spawn_backend(config)?;
    let invoices = backend
        .get_all_invoices()
        .context("failed to load invoices")?;

    if invoices.is_empty() {
        println!("No invoices found.");
    } else {
        println!("{}", report::history_table(&invoices));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let mut config = DeskConfig::load(&config_path)?;
    if let Some(program) = cli.backend {
        config.backend.command = program;
    }
    tracing::debug!(path = %config_path.display(), backend = %config.backend.command, "configuration loaded");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_desk(config),
        Commands::Config => {
            config.save(&config_path)?;
            println!("# {}", config_path.display());
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::History => print_history(&config),
    }
}
