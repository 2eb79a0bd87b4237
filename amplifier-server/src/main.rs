//! Amplifier Playground Bridge Server
//!
//! Serves the playground's streaming and buffered execution endpoints,
//! running one worker process per request.

use std::path::PathBuf;

use amplifier_config::{AmplifierConfig, ConfigLoader};
use anyhow::{Context, Result};
use clap::Parser;

use amplifier_server::Server;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Server bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory containing the worker scripts
    #[arg(long, value_name = "DIR")]
    scripts_dir: Option<PathBuf>,

    /// Interpreter used to run worker scripts
    #[arg(long)]
    interpreter: Option<String>,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", AmplifierConfig::generate_sample());
        return Ok(());
    }

    // Load configuration; the file (if any) is read first, then AMPLIFIER_* overrides
    let mut config = ConfigLoader::new()
        .load(cli.config.as_ref())
        .context("Failed to load configuration")?;

    apply_cli_overrides(&mut config, &cli);
    config
        .validate_all()
        .context("Invalid configuration after command-line overrides")?;

    let server = Server::new(config)?;
    server.start().await
}

/// Apply CLI argument overrides to configuration
fn apply_cli_overrides(config: &mut AmplifierConfig, cli: &Cli) {
    if let Some(bind) = &cli.bind {
        config.server.bind_address = bind.clone();
    }

    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if let Some(dir) = &cli.scripts_dir {
        config.worker.scripts_dir = dir.clone();
    }

    if let Some(interpreter) = &cli.interpreter {
        config.worker.interpreter = interpreter.clone();
    }
}
