// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use cohort_db::{ArrayUnion, Document, DocumentStore};
use serde::{Serialize, Serializer};

use crate::types::{Event, EventId, StoredEvent};

pub const EVENTS_COLLECTION: &str = "events";

const REGISTERED_USERS_FIELD: &str = "registeredUsers";

/// User-facing event failures. `Display` is the message shown to users and
/// the value the error serializes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
	#[error("Failed to add event")]
	AddFailed,

	#[error("Failed to fetch events")]
	ListFailed,

	#[error("Event not found")]
	NotFound,

	#[error("Failed to fetch event")]
	FetchFailed,

	#[error("Already registered for this event")]
	AlreadyRegistered,

	#[error("Failed to register for event")]
	RegisterFailed,

	#[error("Failed to fetch user events")]
	UserEventsFailed,
}

impl Serialize for EventError {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

// =============================================================================
// Result records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddEventResult {
	pub id: Option<EventId>,
	pub error: Option<EventError>,
}

/// `events` is empty, never absent, when `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventsResult {
	pub events: Vec<StoredEvent>,
	pub error: Option<EventError>,
}

impl EventsResult {
	fn failed(error: EventError) -> Self {
		Self {
			events: Vec::new(),
			error: Some(error),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventResult {
	pub event: Option<StoredEvent>,
	pub error: Option<EventError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterResult {
	pub error: Option<EventError>,
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Clone)]
pub struct EventRegistry {
	store: Arc<dyn DocumentStore>,
}

impl EventRegistry {
	pub fn new(store: Arc<dyn DocumentStore>) -> Self {
		Self { store }
	}

	/// Store `event` and return the id the store assigned. Repeated
	/// identities in `registered_users` are collapsed first.
	#[tracing::instrument(skip(self, event), fields(title = %event.title))]
	pub async fn add_event(&self, mut event: Event) -> AddEventResult {
		event.dedup_registered_users();

		let data = match serde_json::to_value(&event) {
			Ok(data) => data,
			Err(e) => {
				tracing::error!(error = %e, "failed to encode event");
				return AddEventResult {
					id: None,
					error: Some(EventError::AddFailed),
				};
			}
		};

		match self.store.insert_document(EVENTS_COLLECTION, &data).await {
			Ok(id) => {
				tracing::info!(event_id = %id, "event added");
				AddEventResult {
					id: Some(EventId::new(id)),
					error: None,
				}
			}
			Err(e) => {
				tracing::error!(error = %e, "failed to add event");
				AddEventResult {
					id: None,
					error: Some(EventError::AddFailed),
				}
			}
		}
	}

	/// All events in insertion order.
	#[tracing::instrument(skip(self))]
	pub async fn get_events(&self) -> EventsResult {
		let docs = match self.store.list_documents(EVENTS_COLLECTION).await {
			Ok(docs) => docs,
			Err(e) => {
				tracing::warn!(error = %e, "failed to list events");
				return EventsResult::failed(EventError::ListFailed);
			}
		};

		match decode_all(docs) {
			Some(events) => EventsResult {
				events,
				error: None,
			},
			None => EventsResult::failed(EventError::ListFailed),
		}
	}

	#[tracing::instrument(skip(self, id), fields(event_id = %id))]
	pub async fn get_event(&self, id: &EventId) -> EventResult {
		let result = match self.store.get_document(EVENTS_COLLECTION, id.as_str()).await {
			Ok(Some(doc)) => decode(doc).ok_or(EventError::FetchFailed),
			Ok(None) => Err(EventError::NotFound),
			Err(e) => {
				tracing::warn!(error = %e, "failed to fetch event");
				Err(EventError::FetchFailed)
			}
		};

		match result {
			Ok(event) => EventResult {
				event: Some(event),
				error: None,
			},
			Err(error) => EventResult {
				event: None,
				error: Some(error),
			},
		}
	}

	/// Add `user_id` to the event's registered users.
	///
	/// The existence check, membership check and append happen in one
	/// conditional update, so concurrent registrations of the same user
	/// produce exactly one success. A repeat registration is rejected with
	/// [`EventError::AlreadyRegistered`] and writes nothing.
	#[tracing::instrument(skip_all, fields(event_id = %event_id, user_id = %user_id))]
	pub async fn register_for_event(&self, event_id: &EventId, user_id: &str) -> RegisterResult {
		let outcome = self
			.store
			.add_to_array_field(
				EVENTS_COLLECTION,
				event_id.as_str(),
				REGISTERED_USERS_FIELD,
				user_id,
			)
			.await;

		let error = match outcome {
			Ok(ArrayUnion::Added) => {
				tracing::info!("user registered for event");
				None
			}
			Ok(ArrayUnion::AlreadyPresent) => {
				tracing::debug!("user already registered");
				Some(EventError::AlreadyRegistered)
			}
			Ok(ArrayUnion::NotFound) => Some(EventError::NotFound),
			Err(e) => {
				tracing::error!(error = %e, "failed to register for event");
				Some(EventError::RegisterFailed)
			}
		};

		RegisterResult { error }
	}

	/// Events whose registered users include `user_id`, in insertion order.
	#[tracing::instrument(skip_all, fields(user_id = %user_id))]
	pub async fn get_user_events(&self, user_id: &str) -> EventsResult {
		let docs = match self
			.store
			.list_documents_where_array_contains(EVENTS_COLLECTION, REGISTERED_USERS_FIELD, user_id)
			.await
		{
			Ok(docs) => docs,
			Err(e) => {
				tracing::warn!(error = %e, "failed to list user events");
				return EventsResult::failed(EventError::UserEventsFailed);
			}
		};

		match decode_all(docs) {
			Some(events) => EventsResult {
				events,
				error: None,
			},
			None => EventsResult::failed(EventError::UserEventsFailed),
		}
	}
}

fn decode(doc: Document) -> Option<StoredEvent> {
	match serde_json::from_value::<Event>(doc.data) {
		Ok(event) => Some(StoredEvent {
			id: EventId::new(doc.id),
			event,
		}),
		Err(e) => {
			tracing::warn!(event_id = %doc.id, error = %e, "stored event is malformed");
			None
		}
	}
}

fn decode_all(docs: Vec<Document>) -> Option<Vec<StoredEvent>> {
	docs.into_iter().map(decode).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::fixtures::rust_workshop;
	use cohort_db::testing::{create_test_repository, UnavailableStore};
	use proptest::prelude::*;
	use serde_json::json;

	async fn registry() -> (EventRegistry, Arc<dyn DocumentStore>) {
		let store: Arc<dyn DocumentStore> = Arc::new(create_test_repository().await);
		(EventRegistry::new(Arc::clone(&store)), store)
	}

	fn unavailable() -> EventRegistry {
		EventRegistry::new(Arc::new(UnavailableStore))
	}

	async fn stored_users(store: &Arc<dyn DocumentStore>, id: &EventId) -> serde_json::Value {
		let doc = store
			.get_document(EVENTS_COLLECTION, id.as_str())
			.await
			.unwrap()
			.unwrap();
		doc.data[REGISTERED_USERS_FIELD].clone()
	}

	#[tokio::test]
	async fn add_then_get_round_trips() {
		let (events, _) = registry().await;

		let added = events.add_event(rust_workshop()).await;
		assert!(added.error.is_none());
		let id = added.id.unwrap();

		let result = events.get_event(&id).await;
		assert!(result.error.is_none());
		let stored = result.event.unwrap();
		assert_eq!(stored.id, id);
		assert_eq!(stored.event, rust_workshop());
	}

	#[tokio::test]
	async fn get_events_lists_in_insertion_order() {
		let (events, _) = registry().await;
		let mut second = rust_workshop();
		second.title = "Embedded Rust".to_string();

		let first_id = events.add_event(rust_workshop()).await.id.unwrap();
		let second_id = events.add_event(second).await.id.unwrap();

		let result = events.get_events().await;
		assert!(result.error.is_none());
		let ids: Vec<_> = result.events.iter().map(|e| e.id.clone()).collect();
		assert_eq!(ids, vec![first_id, second_id]);
	}

	#[tokio::test]
	async fn missing_event_is_not_found() {
		let (events, _) = registry().await;

		let result = events.get_event(&EventId::new("missing-id")).await;
		assert_eq!(result.event, None);
		assert_eq!(result.error, Some(EventError::NotFound));
		assert_eq!(
			serde_json::to_value(&result).unwrap(),
			json!({"event": null, "error": "Event not found"})
		);
	}

	#[tokio::test]
	async fn register_twice_is_rejected_and_stored_once() {
		let (events, store) = registry().await;
		let id = events.add_event(rust_workshop()).await.id.unwrap();

		assert_eq!(events.register_for_event(&id, "u1").await.error, None);
		assert_eq!(
			events.register_for_event(&id, "u1").await.error,
			Some(EventError::AlreadyRegistered)
		);
		assert_eq!(stored_users(&store, &id).await, json!(["u1"]));
	}

	#[tokio::test]
	async fn existing_registration_is_kept_and_new_user_appended() {
		let (events, store) = registry().await;
		let mut event = rust_workshop();
		event.registered_users = Some(vec!["u1".to_string()]);
		let id = events.add_event(event).await.id.unwrap();

		let result = events.register_for_event(&id, "u1").await;
		assert_eq!(
			serde_json::to_value(&result).unwrap(),
			json!({"error": "Already registered for this event"})
		);
		assert_eq!(stored_users(&store, &id).await, json!(["u1"]));

		let result = events.register_for_event(&id, "u2").await;
		assert_eq!(serde_json::to_value(&result).unwrap(), json!({"error": null}));
		assert_eq!(stored_users(&store, &id).await, json!(["u1", "u2"]));
	}

	#[tokio::test]
	async fn register_for_unknown_event_writes_nothing() {
		let (events, store) = registry().await;

		let result = events.register_for_event(&EventId::new("nope"), "u1").await;
		assert_eq!(result.error, Some(EventError::NotFound));
		assert!(store
			.list_documents(EVENTS_COLLECTION)
			.await
			.unwrap()
			.is_empty());
	}

	#[tokio::test]
	async fn concurrent_registrations_have_one_winner() {
		let (events, store) = registry().await;
		let id = events.add_event(rust_workshop()).await.id.unwrap();

		let attempts = (0..8).map(|_| events.register_for_event(&id, "u1"));
		let results = futures::future::join_all(attempts).await;

		let successes = results.iter().filter(|r| r.error.is_none()).count();
		assert_eq!(successes, 1);
		assert!(results
			.iter()
			.filter(|r| r.error.is_some())
			.all(|r| r.error == Some(EventError::AlreadyRegistered)));
		assert_eq!(stored_users(&store, &id).await, json!(["u1"]));
	}

	#[tokio::test]
	async fn user_events_filters_by_registration() {
		let (events, _) = registry().await;
		let mut other = rust_workshop();
		other.title = "Embedded Rust".to_string();
		let first = events.add_event(rust_workshop()).await.id.unwrap();
		let second = events.add_event(other).await.id.unwrap();

		events.register_for_event(&first, "u1").await;
		events.register_for_event(&second, "u2").await;

		let result = events.get_user_events("u1").await;
		assert!(result.error.is_none());
		assert_eq!(result.events.len(), 1);
		assert_eq!(result.events[0].id, first);
		assert!(result.events[0].event.is_registered("u1"));

		assert!(events.get_user_events("nobody").await.events.is_empty());
	}

	#[tokio::test]
	async fn add_event_collapses_duplicate_registrations() {
		let (events, store) = registry().await;
		let mut event = rust_workshop();
		event.registered_users = Some(vec!["u1".to_string(), "u1".to_string()]);

		let id = events.add_event(event).await.id.unwrap();
		assert_eq!(stored_users(&store, &id).await, json!(["u1"]));
	}

	#[tokio::test]
	async fn malformed_stored_event_is_a_fetch_failure() {
		let (events, store) = registry().await;
		let id = store
			.insert_document(EVENTS_COLLECTION, &json!({"title": 7}))
			.await
			.unwrap();

		let result = events.get_event(&EventId::new(id)).await;
		assert_eq!(result.error, Some(EventError::FetchFailed));
		assert_eq!(events.get_events().await.error, Some(EventError::ListFailed));
	}

	#[tokio::test]
	async fn store_failures_map_to_fixed_messages() {
		let events = unavailable();
		let id = EventId::new("evt-1");

		let added = events.add_event(rust_workshop()).await;
		assert_eq!(
			serde_json::to_value(&added).unwrap(),
			json!({"id": null, "error": "Failed to add event"})
		);

		let listed = events.get_events().await;
		assert_eq!(
			serde_json::to_value(&listed).unwrap(),
			json!({"events": [], "error": "Failed to fetch events"})
		);

		let fetched = events.get_event(&id).await;
		assert_eq!(fetched.error, Some(EventError::FetchFailed));
		assert_eq!(fetched.error.unwrap().to_string(), "Failed to fetch event");

		let registered = events.register_for_event(&id, "u1").await;
		assert_eq!(
			registered.error.map(|e| e.to_string()).as_deref(),
			Some("Failed to register for event")
		);

		let mine = events.get_user_events("u1").await;
		assert!(mine.events.is_empty());
		assert_eq!(
			mine.error.map(|e| e.to_string()).as_deref(),
			Some("Failed to fetch user events")
		);
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(24))]

		#[test]
		fn prop_first_registration_wins(users in proptest::collection::vec("u[0-3]", 1..10)) {
			tokio_test::block_on(async {
				let (events, store) = registry().await;
				let id = events.add_event(rust_workshop()).await.id.unwrap();

				let mut seen: Vec<String> = Vec::new();
				for user in &users {
					let result = events.register_for_event(&id, user).await;
					if seen.contains(user) {
						assert_eq!(result.error, Some(EventError::AlreadyRegistered));
					} else {
						assert_eq!(result.error, None);
						seen.push(user.clone());
					}
				}

				assert_eq!(stored_users(&store, &id).await, json!(seen));
			});
		}
	}
}
