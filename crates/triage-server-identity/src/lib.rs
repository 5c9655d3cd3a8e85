// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity store adapter boundary for Triage.
//!
//! The identity/credential store is an external collaborator; this crate
//! defines the narrow contract the provisioning core calls through:
//! [`IdentityStore`] with exactly the two operations the approval saga
//! needs, account creation and the compensating deletion.
//!
//! A real deployment implements this trait against its credential backend.
//! [`testing::InMemoryIdentityStore`] ships here so orchestrator tests can
//! drive every partial-failure branch.

pub mod testing;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use triage_server_auth::{types::AccountId, whitelist::WhitelistEntry};

/// Errors surfaced by an identity store implementation.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
	#[error("account already exists: {0}")]
	Duplicate(String),

	#[error("account not found: {0}")]
	NotFound(String),

	#[error("identity store unavailable: {0}")]
	Unavailable(String),
}

/// A request to create a credentialed account.
///
/// `metadata` carries the free-form fields the identity store keeps
/// alongside the credential; the authoritative role record is the profile
/// row, not this metadata.
#[derive(Clone)]
pub struct NewAccount {
	/// Email address, normalized to lowercase.
	pub email: String,
	/// Initial password. Never logged; `Debug` redacts it.
	pub password: String,
	/// Whether the email is considered confirmed at creation. Whitelisted
	/// admits skip the verification email, so approval sets this.
	pub confirmed: bool,
	/// Free-form metadata stored with the account.
	pub metadata: Map<String, Value>,
}

impl NewAccount {
	/// Build the account-creation request for an approved whitelist entry.
	pub fn from_entry(entry: &WhitelistEntry, password: &str) -> Self {
		let mut metadata = Map::new();
		metadata.insert(
			"user_type".to_string(),
			Value::String(entry.user_type.to_string()),
		);
		metadata.insert(
			"full_name".to_string(),
			Value::String(entry.full_name.clone()),
		);
		if let Some(phone) = &entry.phone {
			metadata.insert("phone".to_string(), Value::String(phone.clone()));
		}
		if let Some(specialization) = &entry.specialization {
			metadata.insert(
				"specialization".to_string(),
				Value::String(specialization.clone()),
			);
		}

		Self {
			email: entry.email.clone(),
			password: password.to_string(),
			confirmed: true,
			metadata,
		}
	}
}

impl fmt::Debug for NewAccount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NewAccount")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("confirmed", &self.confirmed)
			.field("metadata", &self.metadata)
			.finish()
	}
}

/// The identity store contract the provisioning core calls through.
#[async_trait]
pub trait IdentityStore: Send + Sync {
	/// Create a credentialed account, returning its opaque identifier.
	async fn create_account(&self, account: &NewAccount) -> Result<AccountId, IdentityError>;

	/// Delete an account. Used by the approval saga to compensate when a
	/// later step fails.
	async fn delete_account(&self, id: &AccountId) -> Result<(), IdentityError>;
}
