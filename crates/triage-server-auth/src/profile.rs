// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Profile entity: the authoritative role and identity record.
//!
//! A [`Profile`] is created together with an identity-store account during
//! approval and is keyed by the account's opaque identifier. The rest of the
//! application (including the admission guard in the provisioning crate)
//! reads roles from here, never from the identity store's metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, UserType};
use crate::whitelist::WhitelistEntry;

/// A provisioned user's profile.
///
/// # PII Handling
///
/// Mirrors the invitee PII from the whitelist entry; redact in logs and
/// reference profiles by `account_id` in tracing spans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
	/// The identity-store account this profile belongs to.
	pub account_id: AccountId,

	/// Email address, normalized to lowercase.
	pub email: String,

	/// The account's role.
	pub user_type: UserType,

	/// Full name.
	pub full_name: String,

	/// Contact phone number.
	pub phone: Option<String>,

	/// Department the user belongs to.
	pub department_id: Option<String>,

	/// Clinical specialization, if any.
	pub specialization: Option<String>,

	/// Professional license number, if any.
	pub license_number: Option<String>,

	/// When the profile was created.
	pub created_at: DateTime<Utc>,

	/// When the profile was last updated.
	pub updated_at: DateTime<Utc>,
}

impl Profile {
	/// Build the profile for a freshly provisioned account, copying the
	/// descriptive fields from the whitelist entry.
	pub fn from_entry(entry: &WhitelistEntry, account_id: AccountId) -> Self {
		let now = Utc::now();
		Self {
			account_id,
			email: entry.email.clone(),
			user_type: entry.user_type,
			full_name: entry.full_name.clone(),
			phone: entry.phone.clone(),
			department_id: entry.department_id.clone(),
			specialization: entry.specialization.clone(),
			license_number: entry.license_number.clone(),
			created_at: now,
			updated_at: now,
		}
	}

	/// Returns true if this profile holds the admin role.
	pub fn is_admin(&self) -> bool {
		self.user_type.is_admin()
	}
}
