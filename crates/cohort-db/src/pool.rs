// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;

use crate::error::DbError;

/// Create a SqlitePool with WAL mode and common settings.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./cohort.db")
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid or connection fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Apply all schema migrations. Safe to run more than once.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	let m1 = include_str!("../migrations/001_create_documents.sql");
	for stmt in statements(m1) {
		sqlx::query(stmt).execute(pool).await?;
	}

	tracing::info!("database migrations applied");
	Ok(())
}

fn statements(sql: &str) -> impl Iterator<Item = &str> {
	sql.split(';').filter(|s| {
		s.lines()
			.any(|line| !line.trim().is_empty() && !line.trim_start().starts_with("--"))
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_statements_skip_comments_and_blanks() {
		let sql = "-- header\n\nCREATE TABLE a (x INT);\n\n-- trailing\n";
		let stmts: Vec<_> = statements(sql).collect();
		assert_eq!(stmts.len(), 1);
		assert!(stmts[0].contains("CREATE TABLE a"));
	}

	#[tokio::test]
	async fn test_migrations_are_idempotent_on_file_db() {
		let dir = TempDir::new().unwrap();
		let url = format!("sqlite:{}", dir.path().join("cohort.db").display());
		let pool = create_pool(&url).await.unwrap();

		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let count: i64 = sqlx::query_scalar(
			"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'documents'",
		)
		.fetch_one(&pool)
		.await
		.unwrap();
		assert_eq!(count, 1);
	}

	#[tokio::test]
	async fn test_invalid_url_option_is_internal_error() {
		let err = create_pool("sqlite:cohort.db?mode=bogus").await.unwrap_err();
		assert!(matches!(err, DbError::Internal(_)));
	}
}
