// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Whitelist repository for database operations.
//!
//! This module provides durable storage for whitelist entries:
//! - Entry insertion with a uniqueness guarantee for pending emails
//! - Lookups by id and by email (admission checks for re-invites)
//! - The conditional status transition used by the approval workflow
//!
//! Entries are never deleted; the status transition out of `pending` is the
//! terminal event in their lifecycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use triage_server_auth::{
	types::{AccountId, WhitelistId, WhitelistStatus},
	whitelist::WhitelistEntry,
};

use crate::error::DbError;

#[async_trait]
pub trait WhitelistStore: Send + Sync {
	async fn insert(&self, entry: &WhitelistEntry) -> Result<(), DbError>;
	async fn get_by_id(&self, id: &WhitelistId) -> Result<Option<WhitelistEntry>, DbError>;
	async fn find_blocking_by_email(&self, email: &str)
		-> Result<Option<WhitelistEntry>, DbError>;
	async fn list_pending(&self) -> Result<Vec<WhitelistEntry>, DbError>;
	async fn mark_decided(
		&self,
		id: &WhitelistId,
		new_status: WhitelistStatus,
		decided_by: &AccountId,
		decided_at: DateTime<Utc>,
	) -> Result<(), DbError>;
}

/// Repository for whitelist database operations.
///
/// All IDs are UUIDs stored as strings in SQLite; timestamps are RFC 3339
/// text. Emails arrive already normalized (lowercase) from the caller.
#[derive(Clone)]
pub struct WhitelistRepository {
	pool: SqlitePool,
}

impl WhitelistRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a new whitelist entry.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if another entry for the same email is
	/// already pending (partial unique index on `email WHERE status =
	/// 'pending'`), `DbError::Sqlx` for other failures.
	#[tracing::instrument(skip(self, entry), fields(whitelist_id = %entry.id, user_type = %entry.user_type))]
	pub async fn insert(&self, entry: &WhitelistEntry) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			INSERT INTO whitelist_entries (
				id, email, user_type, full_name, phone, department_id,
				specialization, license_number, invited_by, status,
				approved_by, approved_at, created_at, updated_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(entry.id.to_string())
		.bind(&entry.email)
		.bind(entry.user_type.to_string())
		.bind(&entry.full_name)
		.bind(&entry.phone)
		.bind(&entry.department_id)
		.bind(&entry.specialization)
		.bind(&entry.license_number)
		.bind(entry.invited_by.to_string())
		.bind(entry.status.to_string())
		.bind(entry.approved_by.map(|a| a.to_string()))
		.bind(entry.approved_at.map(|t| t.to_rfc3339()))
		.bind(entry.created_at.to_rfc3339())
		.bind(entry.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await;

		match result {
			Ok(_) => {
				tracing::debug!(whitelist_id = %entry.id, "whitelist entry created");
				Ok(())
			}
			Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(DbError::Conflict(
				"a pending whitelist entry already exists for this email".to_string(),
			)),
			Err(e) => Err(e.into()),
		}
	}

	/// Get a whitelist entry by ID.
	///
	/// # Returns
	/// `None` if no entry exists with this ID.
	#[tracing::instrument(skip(self), fields(whitelist_id = %id))]
	pub async fn get_by_id(&self, id: &WhitelistId) -> Result<Option<WhitelistEntry>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, email, user_type, full_name, phone, department_id,
				specialization, license_number, invited_by, status,
				approved_by, approved_at, created_at, updated_at
			FROM whitelist_entries
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_entry(&r)).transpose()
	}

	/// Find the entry that blocks re-inviting an email, if any.
	///
	/// An email is blocked while it has a `pending` or `approved` entry;
	/// `rejected` entries do not block. Returns the most recent blocker.
	#[tracing::instrument(skip(self, email))]
	pub async fn find_blocking_by_email(
		&self,
		email: &str,
	) -> Result<Option<WhitelistEntry>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, email, user_type, full_name, phone, department_id,
				specialization, license_number, invited_by, status,
				approved_by, approved_at, created_at, updated_at
			FROM whitelist_entries
			WHERE email = ? AND status IN ('pending', 'approved')
			ORDER BY created_at DESC
			LIMIT 1
			"#,
		)
		.bind(email)
		.fetch_optional(&self.pool)
		.await?;

		let result = row.map(|r| self.row_to_entry(&r)).transpose()?;
		if let Some(ref entry) = result {
			tracing::debug!(whitelist_id = %entry.id, status = %entry.status, "blocking entry found for email");
		}
		Ok(result)
	}

	/// List all pending entries, oldest first.
	#[tracing::instrument(skip(self))]
	pub async fn list_pending(&self) -> Result<Vec<WhitelistEntry>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, email, user_type, full_name, phone, department_id,
				specialization, license_number, invited_by, status,
				approved_by, approved_at, created_at, updated_at
			FROM whitelist_entries
			WHERE status = 'pending'
			ORDER BY created_at ASC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		let entries: Result<Vec<_>, _> = rows.iter().map(|r| self.row_to_entry(r)).collect();
		let entries = entries?;
		tracing::debug!(count = entries.len(), "listed pending whitelist entries");
		Ok(entries)
	}

	/// Transition a pending entry to a terminal status.
	///
	/// The update is conditional on the entry still being `pending`, so two
	/// concurrent decisions cannot both succeed.
	///
	/// # Errors
	/// Returns `DbError::ConditionFailed` if the entry was not in `pending`
	/// when the update ran (already decided, or does not exist).
	#[tracing::instrument(skip(self), fields(whitelist_id = %id, new_status = %new_status, decided_by = %decided_by))]
	pub async fn mark_decided(
		&self,
		id: &WhitelistId,
		new_status: WhitelistStatus,
		decided_by: &AccountId,
		decided_at: DateTime<Utc>,
	) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE whitelist_entries
			SET status = ?, approved_by = ?, approved_at = ?, updated_at = ?
			WHERE id = ? AND status = 'pending'
			"#,
		)
		.bind(new_status.to_string())
		.bind(decided_by.to_string())
		.bind(decided_at.to_rfc3339())
		.bind(decided_at.to_rfc3339())
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::ConditionFailed(format!(
				"whitelist entry {id} is not pending"
			)));
		}

		tracing::debug!(whitelist_id = %id, new_status = %new_status, "whitelist entry decided");
		Ok(())
	}

	fn row_to_entry(&self, row: &sqlx::sqlite::SqliteRow) -> Result<WhitelistEntry, DbError> {
		let id: String = row.try_get("id")?;
		let user_type: String = row.try_get("user_type")?;
		let status: String = row.try_get("status")?;
		let invited_by: String = row.try_get("invited_by")?;
		let approved_by: Option<String> = row.try_get("approved_by")?;
		let approved_at: Option<String> = row.try_get("approved_at")?;
		let created_at: String = row.try_get("created_at")?;
		let updated_at: String = row.try_get("updated_at")?;

		Ok(WhitelistEntry {
			id: parse_id(&id)?,
			email: row.try_get("email")?,
			user_type: user_type
				.parse()
				.map_err(|e| DbError::Internal(format!("invalid user_type in row: {e}")))?,
			full_name: row.try_get("full_name")?,
			phone: row.try_get("phone")?,
			department_id: row.try_get("department_id")?,
			specialization: row.try_get("specialization")?,
			license_number: row.try_get("license_number")?,
			invited_by: AccountId::new(parse_uuid(&invited_by)?),
			status: status
				.parse()
				.map_err(|e| DbError::Internal(format!("invalid status in row: {e}")))?,
			approved_by: approved_by
				.map(|a| parse_uuid(&a).map(AccountId::new))
				.transpose()?,
			approved_at: approved_at.map(|t| parse_timestamp(&t)).transpose()?,
			created_at: parse_timestamp(&created_at)?,
			updated_at: parse_timestamp(&updated_at)?,
		})
	}
}

#[async_trait]
impl WhitelistStore for WhitelistRepository {
	async fn insert(&self, entry: &WhitelistEntry) -> Result<(), DbError> {
		WhitelistRepository::insert(self, entry).await
	}

	async fn get_by_id(&self, id: &WhitelistId) -> Result<Option<WhitelistEntry>, DbError> {
		WhitelistRepository::get_by_id(self, id).await
	}

	async fn find_blocking_by_email(
		&self,
		email: &str,
	) -> Result<Option<WhitelistEntry>, DbError> {
		WhitelistRepository::find_blocking_by_email(self, email).await
	}

	async fn list_pending(&self) -> Result<Vec<WhitelistEntry>, DbError> {
		WhitelistRepository::list_pending(self).await
	}

	async fn mark_decided(
		&self,
		id: &WhitelistId,
		new_status: WhitelistStatus,
		decided_by: &AccountId,
		decided_at: DateTime<Utc>,
	) -> Result<(), DbError> {
		WhitelistRepository::mark_decided(self, id, new_status, decided_by, decided_at).await
	}
}

pub(crate) fn parse_uuid(s: &str) -> Result<uuid::Uuid, DbError> {
	uuid::Uuid::parse_str(s).map_err(|e| DbError::Internal(format!("invalid UUID in row: {e}")))
}

pub(crate) fn parse_id(s: &str) -> Result<WhitelistId, DbError> {
	Ok(WhitelistId::new(parse_uuid(s)?))
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(s)
		.map(|t| t.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid timestamp in row: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_provisioning_test_pool;
	use proptest::prelude::*;
	use std::collections::HashSet;
	use triage_server_auth::{types::UserType, whitelist::InviteRequest};

	proptest! {
		#[test]
		fn whitelist_id_generation_is_unique(count in 1..1000usize) {
			let mut ids = HashSet::new();
			for _ in 0..count {
				let id = WhitelistId::generate();
				prop_assert!(ids.insert(id.to_string()), "Generated duplicate WhitelistId");
			}
		}
	}

	async fn make_repo() -> WhitelistRepository {
		let pool = create_provisioning_test_pool().await;
		WhitelistRepository::new(pool)
	}

	fn make_entry(email: &str) -> WhitelistEntry {
		WhitelistEntry::new(
			InviteRequest {
				email: email.to_string(),
				user_type: UserType::Doctor,
				full_name: "Test Doctor".to_string(),
				phone: None,
				department_id: None,
				specialization: None,
				license_number: None,
			},
			AccountId::generate(),
		)
	}

	#[tokio::test]
	async fn test_insert_and_get_entry() {
		let repo = make_repo().await;
		let entry = make_entry("a@x.com");

		repo.insert(&entry).await.unwrap();

		let fetched = repo.get_by_id(&entry.id).await.unwrap().unwrap();
		assert_eq!(fetched.id, entry.id);
		assert_eq!(fetched.email, "a@x.com");
		assert_eq!(fetched.user_type, UserType::Doctor);
		assert_eq!(fetched.status, WhitelistStatus::Pending);
		assert_eq!(fetched.invited_by, entry.invited_by);
		assert!(fetched.approved_by.is_none());
	}

	#[tokio::test]
	async fn test_get_entry_not_found() {
		let repo = make_repo().await;
		let result = repo.get_by_id(&WhitelistId::generate()).await.unwrap();
		assert!(result.is_none());
	}

	#[tokio::test]
	async fn test_duplicate_pending_email_conflicts() {
		let repo = make_repo().await;
		repo.insert(&make_entry("a@x.com")).await.unwrap();

		let err = repo.insert(&make_entry("a@x.com")).await.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)), "got: {err:?}");
	}

	#[tokio::test]
	async fn test_rejected_email_can_be_inserted_again() {
		let repo = make_repo().await;
		let first = make_entry("a@x.com");
		repo.insert(&first).await.unwrap();
		repo
			.mark_decided(
				&first.id,
				WhitelistStatus::Rejected,
				&AccountId::generate(),
				Utc::now(),
			)
			.await
			.unwrap();

		repo.insert(&make_entry("a@x.com")).await.unwrap();
	}

	#[tokio::test]
	async fn test_find_blocking_by_email() {
		let repo = make_repo().await;
		let entry = make_entry("a@x.com");
		repo.insert(&entry).await.unwrap();

		let blocking = repo.find_blocking_by_email("a@x.com").await.unwrap();
		assert_eq!(blocking.unwrap().id, entry.id);

		let none = repo.find_blocking_by_email("b@x.com").await.unwrap();
		assert!(none.is_none());
	}

	#[tokio::test]
	async fn test_rejected_entry_does_not_block() {
		let repo = make_repo().await;
		let entry = make_entry("a@x.com");
		repo.insert(&entry).await.unwrap();
		repo
			.mark_decided(
				&entry.id,
				WhitelistStatus::Rejected,
				&AccountId::generate(),
				Utc::now(),
			)
			.await
			.unwrap();

		let blocking = repo.find_blocking_by_email("a@x.com").await.unwrap();
		assert!(blocking.is_none());
	}

	#[tokio::test]
	async fn test_approved_entry_blocks() {
		let repo = make_repo().await;
		let entry = make_entry("a@x.com");
		repo.insert(&entry).await.unwrap();
		repo
			.mark_decided(
				&entry.id,
				WhitelistStatus::Approved,
				&AccountId::generate(),
				Utc::now(),
			)
			.await
			.unwrap();

		let blocking = repo.find_blocking_by_email("a@x.com").await.unwrap();
		assert_eq!(blocking.unwrap().status, WhitelistStatus::Approved);
	}

	#[tokio::test]
	async fn test_mark_decided_sets_decision_fields() {
		let repo = make_repo().await;
		let entry = make_entry("a@x.com");
		repo.insert(&entry).await.unwrap();

		let admin = AccountId::generate();
		let decided_at = Utc::now();
		repo
			.mark_decided(&entry.id, WhitelistStatus::Approved, &admin, decided_at)
			.await
			.unwrap();

		let fetched = repo.get_by_id(&entry.id).await.unwrap().unwrap();
		assert_eq!(fetched.status, WhitelistStatus::Approved);
		assert_eq!(fetched.approved_by, Some(admin));
		assert_eq!(
			fetched.approved_at.unwrap().to_rfc3339(),
			decided_at.to_rfc3339()
		);
	}

	#[tokio::test]
	async fn test_mark_decided_fails_condition_when_already_decided() {
		let repo = make_repo().await;
		let entry = make_entry("a@x.com");
		repo.insert(&entry).await.unwrap();

		let admin = AccountId::generate();
		repo
			.mark_decided(&entry.id, WhitelistStatus::Rejected, &admin, Utc::now())
			.await
			.unwrap();

		let err = repo
			.mark_decided(&entry.id, WhitelistStatus::Approved, &admin, Utc::now())
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::ConditionFailed(_)), "got: {err:?}");

		// Terminal status is untouched by the losing update.
		let fetched = repo.get_by_id(&entry.id).await.unwrap().unwrap();
		assert_eq!(fetched.status, WhitelistStatus::Rejected);
	}

	#[tokio::test]
	async fn test_mark_decided_fails_condition_for_missing_entry() {
		let repo = make_repo().await;
		let err = repo
			.mark_decided(
				&WhitelistId::generate(),
				WhitelistStatus::Approved,
				&AccountId::generate(),
				Utc::now(),
			)
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::ConditionFailed(_)));
	}

	#[tokio::test]
	async fn test_list_pending_oldest_first() {
		let repo = make_repo().await;

		let mut first = make_entry("first@x.com");
		first.created_at = Utc::now() - chrono::Duration::minutes(10);
		let second = make_entry("second@x.com");
		repo.insert(&first).await.unwrap();
		repo.insert(&second).await.unwrap();

		let decided = make_entry("decided@x.com");
		repo.insert(&decided).await.unwrap();
		repo
			.mark_decided(
				&decided.id,
				WhitelistStatus::Rejected,
				&AccountId::generate(),
				Utc::now(),
			)
			.await
			.unwrap();

		let pending = repo.list_pending().await.unwrap();
		assert_eq!(pending.len(), 2);
		assert_eq!(pending[0].id, first.id);
		assert_eq!(pending[1].id, second.id);
	}
}
