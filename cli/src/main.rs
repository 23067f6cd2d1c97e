// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # pathguard CLI
//!
//! The `pathguard` binary serves contained file reads over HTTP and offers
//! local tooling around the same sandbox.
//!
//! ## Commands
//!
//! - `pathguard serve [--seed]` - Start the HTTP server
//! - `pathguard files seed|resolve|read` - Sandbox operations
//! - `pathguard config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use pathguard::commands::{self, ConfigCommand, FilesCommand};
use pathguard::server;
use pathguard_core::domain::config::PathguardConfig;

/// pathguard - contained file reads for untrusted callers
#[derive(Parser)]
#[command(name = "pathguard")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "PATHGUARD_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Server host used by client commands (default: 127.0.0.1)
    #[arg(long, global = true, env = "PATHGUARD_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Server port used by client commands (default: 4000)
    #[arg(long, global = true, env = "PORT", default_value = "4000")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "PATHGUARD_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    #[command(name = "serve")]
    Serve {
        /// Provision the sample files before accepting requests
        #[arg(long)]
        seed: bool,

        /// Override the configured listen port
        #[arg(long = "listen-port", value_name = "PORT")]
        listen_port: Option<u16>,
    },

    /// Sandbox file operations
    #[command(name = "files")]
    Files {
        #[command(subcommand)]
        command: FilesCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Serve { seed, listen_port }) => {
            let mut config = PathguardConfig::load_or_default(cli.config)
                .context("Failed to load configuration")?;
            if let Some(port) = listen_port {
                config.spec.network.port = port;
            }
            info!("Starting pathguard server");
            server::start_server(config, seed).await
        }
        Some(Commands::Files { command }) => {
            commands::files::handle_command(command, cli.config, &cli.host, cli.port).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
