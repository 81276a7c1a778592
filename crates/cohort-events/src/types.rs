// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event records as stored in the `events` collection (camelCase JSON).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the document store when an event is added.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for EventId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructorStats {
	pub courses: u32,
	pub articles: u32,
	pub students: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
	pub name: String,
	pub role: String,
	pub avatar: String,
	pub description: String,
	pub stats: InstructorStats,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub linkedin: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub medium: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub website: Option<String>,
	pub expertise: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
	pub title: String,
	pub date: String,
	pub time: String,
	pub format: String,
	pub attendee_limit: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub price: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub xp: Option<u32>,
	pub description: String,
	pub skills: Vec<String>,
	pub image_url: String,
	pub learning_outcomes: Vec<String>,
	pub requirements: Vec<String>,
	pub instructor: Instructor,
	/// Identities registered for the event. Absent until the first
	/// registration; never holds the same identity twice.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub registered_users: Option<Vec<String>>,
}

impl Event {
	/// Registered identities, treating an absent set as empty.
	pub fn registered_users(&self) -> &[String] {
		self.registered_users.as_deref().unwrap_or_default()
	}

	pub fn is_registered(&self, user_id: &str) -> bool {
		self.registered_users().iter().any(|u| u == user_id)
	}

	/// Drop repeated identities, keeping first occurrences in order.
	pub(crate) fn dedup_registered_users(&mut self) {
		if let Some(users) = self.registered_users.as_mut() {
			let mut seen = std::collections::HashSet::new();
			users.retain(|u| seen.insert(u.clone()));
		}
	}
}

/// An event together with its store-assigned id. Serializes flat:
/// `{"id": "...", "title": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
	pub id: EventId,
	#[serde(flatten)]
	pub event: Event,
}

#[cfg(test)]
pub(crate) mod fixtures {
	use super::*;

	pub fn rust_workshop() -> Event {
		Event {
			title: "Async Rust Workshop".to_string(),
			date: "2025-03-14".to_string(),
			time: "18:00".to_string(),
			format: "Online".to_string(),
			attendee_limit: 40,
			price: None,
			xp: Some(250),
			description: "Futures, executors and cancellation in practice.".to_string(),
			skills: vec!["rust".to_string(), "tokio".to_string()],
			image_url: "https://images.example.com/async-rust.png".to_string(),
			learning_outcomes: vec!["Write a small executor".to_string()],
			requirements: vec!["Basic Rust".to_string()],
			instructor: Instructor {
				name: "Grace Hopper".to_string(),
				role: "Staff Engineer".to_string(),
				avatar: "https://images.example.com/grace.png".to_string(),
				description: "Compilers and runtimes.".to_string(),
				stats: InstructorStats {
					courses: 4,
					articles: 12,
					students: 900,
				},
				linkedin: None,
				email: Some("grace@example.com".to_string()),
				medium: None,
				website: None,
				expertise: vec!["compilers".to_string()],
			},
			registered_users: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::fixtures::rust_workshop;
	use super::*;
	use serde_json::json;

	#[test]
	fn serializes_camel_case_and_omits_absent_optionals() {
		let value = serde_json::to_value(rust_workshop()).unwrap();
		assert_eq!(value["attendeeLimit"], 40);
		assert_eq!(value["imageUrl"], "https://images.example.com/async-rust.png");
		assert_eq!(value["learningOutcomes"], json!(["Write a small executor"]));
		assert!(value.get("price").is_none());
		assert!(value.get("registeredUsers").is_none());
		assert!(value["instructor"].get("linkedin").is_none());
		assert_eq!(value["instructor"]["email"], "grace@example.com");
	}

	#[test]
	fn stored_event_flattens_id() {
		let stored = StoredEvent {
			id: EventId::new("evt-1"),
			event: rust_workshop(),
		};
		let value = serde_json::to_value(&stored).unwrap();
		assert_eq!(value["id"], "evt-1");
		assert_eq!(value["title"], "Async Rust Workshop");

		let back: StoredEvent = serde_json::from_value(value).unwrap();
		assert_eq!(back, stored);
	}

	#[test]
	fn absent_registered_users_reads_as_empty() {
		let mut event = rust_workshop();
		assert!(event.registered_users().is_empty());
		assert!(!event.is_registered("u1"));

		event.registered_users = Some(vec!["u1".to_string(), "u2".to_string(), "u1".to_string()]);
		event.dedup_registered_users();
		assert_eq!(event.registered_users(), ["u1", "u2"]);
		assert!(event.is_registered("u2"));
	}
}
