// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::document::{ArrayUnion, Document, DocumentRepository, DocumentStore};
use crate::error::DbError;
use crate::pool::run_migrations;

/// In-memory pool with the schema applied. One connection, so every query
/// sees the same database.
pub async fn create_test_pool() -> SqlitePool {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}

pub async fn create_test_repository() -> DocumentRepository {
	DocumentRepository::new(create_test_pool().await)
}

/// Store whose every operation fails, for exercising error paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

fn unavailable() -> DbError {
	DbError::Internal("store unavailable".to_string())
}

#[async_trait]
impl DocumentStore for UnavailableStore {
	async fn insert_document(&self, _: &str, _: &Value) -> Result<String, DbError> {
		Err(unavailable())
	}

	async fn create_document_if_absent(&self, _: &str, _: &str, _: &Value) -> Result<bool, DbError> {
		Err(unavailable())
	}

	async fn get_document(&self, _: &str, _: &str) -> Result<Option<Document>, DbError> {
		Err(unavailable())
	}

	async fn list_documents(&self, _: &str) -> Result<Vec<Document>, DbError> {
		Err(unavailable())
	}

	async fn list_documents_where_array_contains(
		&self,
		_: &str,
		_: &str,
		_: &str,
	) -> Result<Vec<Document>, DbError> {
		Err(unavailable())
	}

	async fn update_document_fields(
		&self,
		_: &str,
		_: &str,
		_: &Map<String, Value>,
	) -> Result<(), DbError> {
		Err(unavailable())
	}

	async fn add_to_array_field(
		&self,
		_: &str,
		_: &str,
		_: &str,
		_: &str,
	) -> Result<ArrayUnion, DbError> {
		Err(unavailable())
	}
}
