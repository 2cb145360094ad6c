// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! solar-history: fold overlapping charge controller exports into one
//! persistent daily history per device.

mod args;
mod commands;
mod formatters;

use anyhow::{Result, anyhow, bail};
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to install log subscriber: {e}"))?;

    match cli.command {
        Commands::Merge(args) => {
            if !commands::merge(&args)? {
                bail!("Device {} was not updated", args.device);
            }
        }
        Commands::Run(args) => {
            if !commands::run(&args)? {
                bail!("Some devices were not updated, see the table above");
            }
        }
        Commands::Inspect(args) => commands::inspect(&args)?,
    }

    Ok(())
}
