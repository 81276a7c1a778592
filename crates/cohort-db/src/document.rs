// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON document repository.
//!
//! Documents live in named collections and are stored as JSON text in the
//! `documents` table. Reads return documents in insertion order. Array
//! fields used as sets (such as an event's registered users) are queried
//! and extended with SQLite JSON1 functions so that membership checks and
//! appends happen inside a single statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;

/// A stored document and its collection-scoped id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
	pub id: String,
	pub data: Value,
	pub created_at: DateTime<Utc>,
}

/// Outcome of [`DocumentStore::add_to_array_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayUnion {
	/// The value was appended.
	Added,
	/// The value was already an element; nothing was written.
	AlreadyPresent,
	/// No document with that id exists in the collection.
	NotFound,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
	async fn insert_document(&self, collection: &str, data: &Value) -> Result<String, DbError>;
	async fn create_document_if_absent(
		&self,
		collection: &str,
		id: &str,
		data: &Value,
	) -> Result<bool, DbError>;
	async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, DbError>;
	async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, DbError>;
	async fn list_documents_where_array_contains(
		&self,
		collection: &str,
		field: &str,
		value: &str,
	) -> Result<Vec<Document>, DbError>;
	async fn update_document_fields(
		&self,
		collection: &str,
		id: &str,
		fields: &Map<String, Value>,
	) -> Result<(), DbError>;
	async fn add_to_array_field(
		&self,
		collection: &str,
		id: &str,
		field: &str,
		value: &str,
	) -> Result<ArrayUnion, DbError>;
}

#[derive(Clone)]
pub struct DocumentRepository {
	pool: SqlitePool,
}

impl DocumentRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a document under a freshly generated id.
	///
	/// # Errors
	/// `DbError::InvalidDocument` if `data` is not a JSON object.
	#[tracing::instrument(skip(self, data))]
	pub async fn insert_document(&self, collection: &str, data: &Value) -> Result<String, DbError> {
		ensure_object(data)?;
		let id = Uuid::new_v4().to_string();
		let now = Utc::now().to_rfc3339();

		sqlx::query(
			r#"
			INSERT INTO documents (collection, id, data, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(collection)
		.bind(&id)
		.bind(serde_json::to_string(data)?)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await?;

		tracing::debug!(document_id = %id, "document inserted");
		Ok(id)
	}

	/// Insert a document under a caller-chosen id unless one already exists.
	///
	/// # Returns
	/// `true` if this call created the document, `false` if it was already there.
	#[tracing::instrument(skip(self, data), fields(document_id = %id))]
	pub async fn create_document_if_absent(
		&self,
		collection: &str,
		id: &str,
		data: &Value,
	) -> Result<bool, DbError> {
		ensure_object(data)?;
		let now = Utc::now().to_rfc3339();

		let result = sqlx::query(
			r#"
			INSERT OR IGNORE INTO documents (collection, id, data, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(collection)
		.bind(id)
		.bind(serde_json::to_string(data)?)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await?;

		let created = result.rows_affected() == 1;
		tracing::debug!(created, "create-if-absent finished");
		Ok(created)
	}

	#[tracing::instrument(skip(self), fields(document_id = %id))]
	pub async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, data, created_at
			FROM documents
			WHERE collection = ? AND id = ?
			"#,
		)
		.bind(collection)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_document(&r)).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, data, created_at
			FROM documents
			WHERE collection = ?
			ORDER BY rowid
			"#,
		)
		.bind(collection)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_document).collect()
	}

	/// Documents whose array `field` contains the string `value`.
	#[tracing::instrument(skip(self))]
	pub async fn list_documents_where_array_contains(
		&self,
		collection: &str,
		field: &str,
		value: &str,
	) -> Result<Vec<Document>, DbError> {
		let path = field_path(field)?;

		let rows = sqlx::query(
			r#"
			SELECT d.id, d.data, d.created_at
			FROM documents d
			WHERE d.collection = ?
				AND json_type(d.data, ?) = 'array'
				AND EXISTS (SELECT 1 FROM json_each(d.data, ?) WHERE json_each.value = ?)
			ORDER BY d.rowid
			"#,
		)
		.bind(collection)
		.bind(&path)
		.bind(&path)
		.bind(value)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_document).collect()
	}

	/// Overwrite the given top-level fields, leaving the others untouched.
	///
	/// # Errors
	/// `DbError::NotFound` if the document does not exist.
	#[tracing::instrument(skip(self, fields), fields(document_id = %id, field_count = fields.len()))]
	pub async fn update_document_fields(
		&self,
		collection: &str,
		id: &str,
		fields: &Map<String, Value>,
	) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;
		let now = Utc::now().to_rfc3339();

		let exists: Option<i64> =
			sqlx::query_scalar("SELECT 1 FROM documents WHERE collection = ? AND id = ?")
				.bind(collection)
				.bind(id)
				.fetch_optional(&mut *tx)
				.await?;
		if exists.is_none() {
			return Err(DbError::NotFound(format!("{collection}/{id}")));
		}

		for (field, value) in fields {
			let path = field_path(field)?;
			sqlx::query(
				r#"
				UPDATE documents
				SET data = json_set(data, ?, json(?)), updated_at = ?
				WHERE collection = ? AND id = ?
				"#,
			)
			.bind(&path)
			.bind(serde_json::to_string(value)?)
			.bind(&now)
			.bind(collection)
			.bind(id)
			.execute(&mut *tx)
			.await?;
		}

		tx.commit().await?;
		tracing::debug!("document fields updated");
		Ok(())
	}

	/// Append `value` to the array `field` unless it is already an element.
	///
	/// Membership test and append are one `UPDATE`, so two concurrent calls
	/// with the same value cannot both report [`ArrayUnion::Added`]. A missing
	/// field is treated as an empty array.
	#[tracing::instrument(skip(self, value), fields(document_id = %id))]
	pub async fn add_to_array_field(
		&self,
		collection: &str,
		id: &str,
		field: &str,
		value: &str,
	) -> Result<ArrayUnion, DbError> {
		let path = field_path(field)?;
		let now = Utc::now().to_rfc3339();

		let result = sqlx::query(
			r#"
			UPDATE documents
			SET data = json_set(
					data,
					?1,
					json_insert(COALESCE(json_extract(data, ?1), '[]'), '$[#]', ?2)
				),
				updated_at = ?3
			WHERE collection = ?4 AND id = ?5
				AND NOT EXISTS (
					SELECT 1 FROM json_each(documents.data, ?1) WHERE json_each.value = ?2
				)
			"#,
		)
		.bind(&path)
		.bind(value)
		.bind(&now)
		.bind(collection)
		.bind(id)
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 1 {
			tracing::debug!("array element added");
			return Ok(ArrayUnion::Added);
		}

		let exists: Option<i64> =
			sqlx::query_scalar("SELECT 1 FROM documents WHERE collection = ? AND id = ?")
				.bind(collection)
				.bind(id)
				.fetch_optional(&self.pool)
				.await?;

		Ok(if exists.is_some() {
			ArrayUnion::AlreadyPresent
		} else {
			ArrayUnion::NotFound
		})
	}
}

#[async_trait]
impl DocumentStore for DocumentRepository {
	async fn insert_document(&self, collection: &str, data: &Value) -> Result<String, DbError> {
		self.insert_document(collection, data).await
	}

	async fn create_document_if_absent(
		&self,
		collection: &str,
		id: &str,
		data: &Value,
	) -> Result<bool, DbError> {
		self.create_document_if_absent(collection, id, data).await
	}

	async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, DbError> {
		self.get_document(collection, id).await
	}

	async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, DbError> {
		self.list_documents(collection).await
	}

	async fn list_documents_where_array_contains(
		&self,
		collection: &str,
		field: &str,
		value: &str,
	) -> Result<Vec<Document>, DbError> {
		self.list_documents_where_array_contains(collection, field, value)
			.await
	}

	async fn update_document_fields(
		&self,
		collection: &str,
		id: &str,
		fields: &Map<String, Value>,
	) -> Result<(), DbError> {
		self.update_document_fields(collection, id, fields).await
	}

	async fn add_to_array_field(
		&self,
		collection: &str,
		id: &str,
		field: &str,
		value: &str,
	) -> Result<ArrayUnion, DbError> {
		self.add_to_array_field(collection, id, field, value).await
	}
}

fn ensure_object(data: &Value) -> Result<(), DbError> {
	if data.is_object() {
		Ok(())
	} else {
		Err(DbError::InvalidDocument(
			"document must be a JSON object".to_string(),
		))
	}
}

/// JSON path for a top-level field. Only plain identifiers are accepted so the
/// path never needs quoting.
fn field_path(field: &str) -> Result<String, DbError> {
	let valid = field
		.chars()
		.next()
		.is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
		&& field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

	if valid {
		Ok(format!("$.{field}"))
	} else {
		Err(DbError::InvalidDocument(format!(
			"invalid field name '{field}'"
		)))
	}
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Result<Document, DbError> {
	let id: String = row.get("id");
	let data: String = row.get("data");
	let created_at: String = row.get("created_at");

	Ok(Document {
		id,
		data: serde_json::from_str(&data)?,
		created_at: DateTime::parse_from_rfc3339(&created_at)
			.map_err(|e| DbError::Internal(format!("invalid created_at: {e}")))?
			.with_timezone(&Utc),
	})
}
