// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `cohort` administration binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cohort_config::{CohortConfig, LogFormat, LoggingConfig};
use cohort_db::{create_pool, run_migrations, DocumentRepository};
use cohort_events::EventRegistry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod version;

use commands::{run_events, EventsCommand, Outcome};

/// Cohort - event catalogue and registration administration.
#[derive(Parser, Debug)]
#[command(name = "cohort", about = "Cohort event administration", version)]
struct Args {
	/// Config file (defaults to /etc/cohort/cohort.toml)
	#[arg(long, global = true, env = "COHORT_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
	/// Apply database migrations
	Migrate,

	/// Manage events and registrations
	#[command(subcommand)]
	Events(EventsCommand),

	/// Show version and build information
	Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();

	if args.command == Command::Version {
		print_json(&serde_json::to_value(version::BuildInfo::current())?)?;
		return Ok(ExitCode::SUCCESS);
	}

	dotenvy::dotenv().ok();

	let config = load_config(args.config.as_deref())?;
	init_tracing(&config.logging);

	let pool = create_pool(&config.database.url)
		.await
		.with_context(|| format!("failed to open database {}", config.database.url))?;
	run_migrations(&pool)
		.await
		.context("failed to apply migrations")?;

	match args.command {
		Command::Migrate => {
			tracing::info!("migrations applied");
			print_json(&serde_json::json!({ "error": null }))?;
			Ok(ExitCode::SUCCESS)
		}
		Command::Events(command) => {
			let registry = EventRegistry::new(Arc::new(DocumentRepository::new(pool)));
			let Outcome { record, failed } = run_events(&registry, command).await?;
			print_json(&record)?;
			Ok(if failed {
				ExitCode::FAILURE
			} else {
				ExitCode::SUCCESS
			})
		}
		Command::Version => Ok(ExitCode::SUCCESS),
	}
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<CohortConfig> {
	let config = match path {
		Some(path) => cohort_config::load_config_with_file(path),
		None => cohort_config::load_config(),
	};
	config.context("failed to load configuration")
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
/// Logs go to stderr so stdout carries only result records.
fn init_tracing(logging: &LoggingConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);
	let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

	match logging.format {
		LogFormat::Pretty => registry.with(fmt.pretty()).init(),
		LogFormat::Compact => registry.with(fmt.compact()).init(),
		LogFormat::Json => registry.with(fmt.json()).init(),
	}
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
	let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
	println!("{out}");
	Ok(())
}
