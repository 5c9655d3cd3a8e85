// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Profile repository for database operations.
//!
//! Profiles are created only by the approval workflow, always paired with an
//! identity-store account. `delete` exists solely so a failed approval can
//! unwind the pair.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};
use triage_server_auth::{profile::Profile, types::AccountId};

use crate::error::DbError;
use crate::whitelist::{parse_timestamp, parse_uuid};

#[async_trait]
pub trait ProfileStore: Send + Sync {
	async fn insert(&self, profile: &Profile) -> Result<(), DbError>;
	async fn get_by_account(&self, account_id: &AccountId) -> Result<Option<Profile>, DbError>;
	async fn delete(&self, account_id: &AccountId) -> Result<bool, DbError>;
}

/// Repository for profile database operations.
#[derive(Clone)]
pub struct ProfileRepository {
	pool: SqlitePool,
}

impl ProfileRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a new profile.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if a profile already exists for this
	/// account or email.
	#[tracing::instrument(skip(self, profile), fields(account_id = %profile.account_id, user_type = %profile.user_type))]
	pub async fn insert(&self, profile: &Profile) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			INSERT INTO profiles (
				account_id, email, user_type, full_name, phone,
				department_id, specialization, license_number,
				created_at, updated_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(profile.account_id.to_string())
		.bind(&profile.email)
		.bind(profile.user_type.to_string())
		.bind(&profile.full_name)
		.bind(&profile.phone)
		.bind(&profile.department_id)
		.bind(&profile.specialization)
		.bind(&profile.license_number)
		.bind(profile.created_at.to_rfc3339())
		.bind(profile.updated_at.to_rfc3339())
		.execute(&self.pool)
		.await;

		match result {
			Ok(_) => {
				tracing::debug!(account_id = %profile.account_id, "profile created");
				Ok(())
			}
			Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(DbError::Conflict(
				"a profile already exists for this account".to_string(),
			)),
			Err(e) => Err(e.into()),
		}
	}

	/// Get a profile by account ID.
	///
	/// # Returns
	/// `None` if no profile exists for this account.
	#[tracing::instrument(skip(self), fields(account_id = %account_id))]
	pub async fn get_by_account(
		&self,
		account_id: &AccountId,
	) -> Result<Option<Profile>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT account_id, email, user_type, full_name, phone,
				department_id, specialization, license_number,
				created_at, updated_at
			FROM profiles
			WHERE account_id = ?
			"#,
		)
		.bind(account_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_profile(&r)).transpose()
	}

	/// Delete a profile.
	///
	/// Used only to unwind a partially provisioned account pair.
	///
	/// # Returns
	/// `true` if a profile was removed, `false` if not found.
	#[tracing::instrument(skip(self), fields(account_id = %account_id))]
	pub async fn delete(&self, account_id: &AccountId) -> Result<bool, DbError> {
		let result = sqlx::query(
			r#"
			DELETE FROM profiles
			WHERE account_id = ?
			"#,
		)
		.bind(account_id.to_string())
		.execute(&self.pool)
		.await?;

		let removed = result.rows_affected() > 0;
		if removed {
			tracing::debug!(account_id = %account_id, "profile deleted");
		}
		Ok(removed)
	}

	fn row_to_profile(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Profile, DbError> {
		let account_id: String = row.try_get("account_id")?;
		let user_type: String = row.try_get("user_type")?;
		let created_at: String = row.try_get("created_at")?;
		let updated_at: String = row.try_get("updated_at")?;

		Ok(Profile {
			account_id: AccountId::new(parse_uuid(&account_id)?),
			email: row.try_get("email")?,
			user_type: user_type
				.parse()
				.map_err(|e| DbError::Internal(format!("invalid user_type in row: {e}")))?,
			full_name: row.try_get("full_name")?,
			phone: row.try_get("phone")?,
			department_id: row.try_get("department_id")?,
			specialization: row.try_get("specialization")?,
			license_number: row.try_get("license_number")?,
			created_at: parse_timestamp(&created_at)?,
			updated_at: parse_timestamp(&updated_at)?,
		})
	}
}

#[async_trait]
impl ProfileStore for ProfileRepository {
	async fn insert(&self, profile: &Profile) -> Result<(), DbError> {
		ProfileRepository::insert(self, profile).await
	}

	async fn get_by_account(&self, account_id: &AccountId) -> Result<Option<Profile>, DbError> {
		ProfileRepository::get_by_account(self, account_id).await
	}

	async fn delete(&self, account_id: &AccountId) -> Result<bool, DbError> {
		ProfileRepository::delete(self, account_id).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_provisioning_test_pool;
	use triage_server_auth::{
		types::UserType,
		whitelist::{InviteRequest, WhitelistEntry},
	};

	async fn make_repo() -> ProfileRepository {
		let pool = create_provisioning_test_pool().await;
		ProfileRepository::new(pool)
	}

	fn make_profile(email: &str) -> Profile {
		let entry = WhitelistEntry::new(
			InviteRequest {
				email: email.to_string(),
				user_type: UserType::Staff,
				full_name: "Test Staff".to_string(),
				phone: Some("555".to_string()),
				department_id: Some("front-desk".to_string()),
				specialization: None,
				license_number: None,
			},
			AccountId::generate(),
		);
		Profile::from_entry(&entry, AccountId::generate())
	}

	#[tokio::test]
	async fn test_insert_and_get_profile() {
		let repo = make_repo().await;
		let profile = make_profile("a@x.com");

		repo.insert(&profile).await.unwrap();

		let fetched = repo.get_by_account(&profile.account_id).await.unwrap().unwrap();
		assert_eq!(fetched.account_id, profile.account_id);
		assert_eq!(fetched.email, "a@x.com");
		assert_eq!(fetched.user_type, UserType::Staff);
		assert_eq!(fetched.department_id.as_deref(), Some("front-desk"));
	}

	#[tokio::test]
	async fn test_get_profile_not_found() {
		let repo = make_repo().await;
		let result = repo.get_by_account(&AccountId::generate()).await.unwrap();
		assert!(result.is_none());
	}

	#[tokio::test]
	async fn test_duplicate_account_conflicts() {
		let repo = make_repo().await;
		let profile = make_profile("a@x.com");
		repo.insert(&profile).await.unwrap();

		let mut dup = make_profile("b@x.com");
		dup.account_id = profile.account_id;
		let err = repo.insert(&dup).await.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)), "got: {err:?}");
	}

	#[tokio::test]
	async fn test_delete_profile() {
		let repo = make_repo().await;
		let profile = make_profile("a@x.com");
		repo.insert(&profile).await.unwrap();

		assert!(repo.delete(&profile.account_id).await.unwrap());
		assert!(repo.get_by_account(&profile.account_id).await.unwrap().is_none());

		// Second delete is a no-op.
		assert!(!repo.delete(&profile.account_id).await.unwrap());
	}
}
