// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Sandbox file commands
//!
//! Commands: seed, resolve, read

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use pathguard_core::domain::config::PathguardConfig;
use pathguard_core::domain::path_containment::{BaseDirectory, PathContainment};

use crate::client::{PathguardClient, ReadOutcome};
use crate::server::build_service;

#[derive(Subcommand)]
pub enum FilesCommand {
    /// Write the sample files into the local sandbox
    Seed {
        /// Ask a running server to provision instead of writing locally
        #[arg(long)]
        remote: bool,
    },

    /// Show how an input would resolve, without touching the filesystem
    Resolve {
        /// Untrusted file name to resolve
        input: String,

        /// Base directory to resolve against (default: configured base_dir)
        #[arg(long, value_name = "DIR")]
        base: Option<PathBuf>,
    },

    /// Read a file through a running server
    Read {
        /// File name relative to the sandbox
        filename: String,

        /// Use the route without request shape checks
        #[arg(long)]
        no_validate: bool,
    },
}

pub async fn handle_command(
    command: FilesCommand,
    config_path: Option<PathBuf>,
    host: &str,
    port: u16,
) -> Result<()> {
    let config = PathguardConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    match command {
        FilesCommand::Seed { remote: false } => seed_local(&config).await,
        FilesCommand::Seed { remote: true } => seed_remote(host, port).await,
        FilesCommand::Resolve { input, base } => resolve(&config, &input, base),
        FilesCommand::Read {
            filename,
            no_validate,
        } => read(host, port, &filename, !no_validate).await,
    }
}

async fn seed_local(config: &PathguardConfig) -> Result<()> {
    let service = build_service(config)?;
    let base = service
        .provision_samples()
        .await
        .context("Failed to provision sample files")?;

    println!("{}", format!("✓ Sample files written to {}", base).green());
    Ok(())
}

async fn seed_remote(host: &str, port: u16) -> Result<()> {
    let client = PathguardClient::new(host, port)?;
    let response = client.setup_samples().await?;

    if response.ok {
        println!(
            "{}",
            format!("✓ Sample files written to {}", response.base).green()
        );
    }
    Ok(())
}

fn resolve(config: &PathguardConfig, input: &str, base: Option<PathBuf>) -> Result<()> {
    let base_path = base.unwrap_or_else(|| config.spec.storage.base_dir.clone());
    let base_path = if base_path.is_absolute() {
        base_path
    } else {
        std::env::current_dir()
            .context("Failed to read working directory")?
            .join(base_path)
    };
    let base = BaseDirectory::from_canonical(&base_path)
        .with_context(|| format!("Invalid base directory {}", base_path.display()))?;

    let containment = PathContainment::with_max_length(config.spec.storage.max_path_len);
    match containment.resolve(&base, input) {
        Ok(resolved) => println!("{} {}", "✓".green(), resolved),
        Err(rejected) => println!("{} {}", "✗".red(), rejected),
    }

    Ok(())
}

async fn read(host: &str, port: u16, filename: &str, validate: bool) -> Result<()> {
    let client = PathguardClient::new(host, port)?;

    match client.read_file(filename, validate).await? {
        ReadOutcome::Found { path, content } => {
            println!("{}", path.dimmed());
            print!("{}", content);
        }
        ReadOutcome::Invalid { messages } => {
            println!("{}", "Invalid request:".red().bold());
            for message in messages {
                println!("  - {}", message);
            }
        }
        ReadOutcome::Forbidden => {
            println!("{}", "Path traversal detected".red());
        }
        ReadOutcome::NotFound { path } => match path {
            Some(path) => println!("{} {}", "File not found:".yellow(), path),
            None => println!("{}", "File not found".yellow()),
        },
    }

    Ok(())
}
