// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event catalogue and registration for Cohort.
//!
//! Events live in the `events` document collection. [`EventRegistry`] adds,
//! lists and looks them up, and registers users. Registration is a single
//! atomic set-union on `registeredUsers`, so a user appears at most once per
//! event even under concurrent requests.

pub mod registry;
pub mod types;

pub use registry::{
	AddEventResult, EventError, EventRegistry, EventResult, EventsResult, RegisterResult,
	EVENTS_COLLECTION,
};
pub use types::{Event, EventId, Instructor, InstructorStats, StoredEvent};
