// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # cohort-db
//!
//! Document persistence for Cohort using SQLite via sqlx.
//!
//! Callers depend on the [`DocumentStore`] trait; [`DocumentRepository`] is
//! the SQLite implementation holding a `SqlitePool`. Every document belongs to
//! a named collection (`events`, `users`) and is a JSON object.
//!
//! ## Error Handling
//!
//! | Variant | When to use |
//! |---------|-------------|
//! | `NotFound` | Document must exist but doesn't (partial update by id) |
//! | `InvalidDocument` | Non-object document or unusable field name |
//! | `Sqlx` | Propagated via `?` for unexpected database errors |
//! | `Internal` | Invalid stored data or connection settings |
//!
//! Point lookups return `Result<Option<T>>`; absence is not an error.
//!
//! ## Testing
//!
//! The `testing` module (enabled for this crate's tests and by the `testing`
//! feature for dependants) builds an in-memory pool with migrations applied.

pub mod document;
mod error;
pub mod pool;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use document::{ArrayUnion, Document, DocumentRepository, DocumentStore};
pub use error::{DbError, Result};
pub use pool::{create_pool, run_migrations};
