// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event subcommands. Each returns the registry's result record as JSON and
//! whether the record carries an error.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use cohort_events::{Event, EventId, EventRegistry};
use serde::Serialize;
use serde_json::Value;

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum EventsCommand {
	/// List events, optionally only those a user registered for
	List {
		/// Only events this user is registered for
		#[arg(long)]
		user: Option<String>,
	},

	/// Show a single event
	Show {
		/// Event id
		id: String,
	},

	/// Add an event from a JSON file (camelCase fields)
	Add {
		/// Path to the event JSON
		file: PathBuf,
	},

	/// Register a user for an event
	Register {
		/// Event id
		event_id: String,
		/// User id
		user_id: String,
	},
}

/// A result record ready to print.
#[derive(Debug)]
pub struct Outcome {
	pub record: Value,
	pub failed: bool,
}

impl Outcome {
	fn from_record<T: Serialize>(record: &T, failed: bool) -> anyhow::Result<Self> {
		Ok(Self {
			record: serde_json::to_value(record).context("failed to encode result")?,
			failed,
		})
	}
}

pub async fn run_events(registry: &EventRegistry, command: EventsCommand) -> anyhow::Result<Outcome> {
	match command {
		EventsCommand::List { user: None } => {
			let result = registry.get_events().await;
			Outcome::from_record(&result, result.error.is_some())
		}
		EventsCommand::List { user: Some(user) } => {
			let result = registry.get_user_events(&user).await;
			Outcome::from_record(&result, result.error.is_some())
		}
		EventsCommand::Show { id } => {
			let result = registry.get_event(&EventId::new(id)).await;
			Outcome::from_record(&result, result.error.is_some())
		}
		EventsCommand::Add { file } => {
			let event = read_event(&file)?;
			let result = registry.add_event(event).await;
			Outcome::from_record(&result, result.error.is_some())
		}
		EventsCommand::Register { event_id, user_id } => {
			let result = registry
				.register_for_event(&EventId::new(event_id), &user_id)
				.await;
			Outcome::from_record(&result, result.error.is_some())
		}
	}
}

fn read_event(path: &Path) -> anyhow::Result<Event> {
	let content = std::fs::read_to_string(path)
		.with_context(|| format!("failed to read {}", path.display()))?;
	serde_json::from_str(&content)
		.with_context(|| format!("{} is not a valid event", path.display()))
}
