// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema setup for the provisioning tables.

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

/// Create the whitelist and profile tables if they do not exist.
///
/// Idempotent; run once at startup.
#[tracing::instrument(skip(pool))]
pub async fn run(pool: &SqlitePool) -> Result<(), DbError> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS whitelist_entries (
			id TEXT PRIMARY KEY,
			email TEXT NOT NULL,
			user_type TEXT NOT NULL CHECK (user_type IN ('doctor', 'staff', 'admin')),
			full_name TEXT NOT NULL,
			phone TEXT,
			department_id TEXT,
			specialization TEXT,
			license_number TEXT,
			invited_by TEXT NOT NULL,
			status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved', 'rejected')),
			approved_by TEXT,
			approved_at TEXT,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	// At most one pending entry per email.
	sqlx::query(
		r#"
		CREATE UNIQUE INDEX IF NOT EXISTS idx_whitelist_pending_email
		ON whitelist_entries(email) WHERE status = 'pending'
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS profiles (
			account_id TEXT PRIMARY KEY,
			email TEXT UNIQUE NOT NULL,
			user_type TEXT NOT NULL CHECK (user_type IN ('doctor', 'staff', 'admin')),
			full_name TEXT NOT NULL,
			phone TEXT,
			department_id TEXT,
			specialization TEXT,
			license_number TEXT,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	tracing::debug!("provisioning schema ready");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	#[tokio::test]
	async fn test_run_is_idempotent() {
		let pool = create_test_pool().await;
		run(&pool).await.unwrap();
		run(&pool).await.unwrap();
	}

	#[tokio::test]
	async fn test_pending_email_index_allows_terminal_duplicates() {
		let pool = create_test_pool().await;
		run(&pool).await.unwrap();

		sqlx::query(
			r#"
			INSERT INTO whitelist_entries (id, email, user_type, full_name, invited_by, status, created_at, updated_at)
			VALUES ('1', 'a@x.com', 'doctor', 'A', 'admin-1', 'rejected', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')
			"#,
		)
		.execute(&pool)
		.await
		.unwrap();

		// A rejected row does not block a new pending row for the same email.
		sqlx::query(
			r#"
			INSERT INTO whitelist_entries (id, email, user_type, full_name, invited_by, status, created_at, updated_at)
			VALUES ('2', 'a@x.com', 'doctor', 'A', 'admin-1', 'pending', '2025-01-02T00:00:00Z', '2025-01-02T00:00:00Z')
			"#,
		)
		.execute(&pool)
		.await
		.unwrap();

		// A second pending row does.
		let result = sqlx::query(
			r#"
			INSERT INTO whitelist_entries (id, email, user_type, full_name, invited_by, status, created_at, updated_at)
			VALUES ('3', 'a@x.com', 'doctor', 'A', 'admin-1', 'pending', '2025-01-03T00:00:00Z', '2025-01-03T00:00:00Z')
			"#,
		)
		.execute(&pool)
		.await;
		assert!(result.is_err());
	}
}
