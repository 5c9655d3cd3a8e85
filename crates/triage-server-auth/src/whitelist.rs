// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Whitelist entry entity and invite request types.
//!
//! A [`WhitelistEntry`] is the durable record of an admin inviting an email
//! address into the system. Entries start `pending` and are moved to a
//! terminal state exactly once by the approval workflow; they are never
//! physically deleted.
//!
//! # PII Handling
//!
//! Entries carry invitee PII (`email`, `full_name`, `phone`,
//! `license_number`). These fields should be redacted in logs; tracing spans
//! reference entries by id only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, UserType, WhitelistId, WhitelistStatus};

/// An invitation request as submitted by an admin.
///
/// `email`, `user_type`, and `full_name` are required; the descriptive
/// fields are optional and are copied verbatim into the eventual profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteRequest {
	/// Email address to invite.
	pub email: String,
	/// Role the account will be provisioned with.
	pub user_type: UserType,
	/// Invitee's full name.
	pub full_name: String,
	/// Contact phone number.
	pub phone: Option<String>,
	/// Department the invitee belongs to.
	pub department_id: Option<String>,
	/// Clinical specialization, if any.
	pub specialization: Option<String>,
	/// Professional license number, if any.
	pub license_number: Option<String>,
}

/// A whitelist entry awaiting or past an admin decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistEntry {
	/// Unique identifier for this entry.
	pub id: WhitelistId,

	/// Invitee email, normalized to lowercase.
	pub email: String,

	/// Role the account will be provisioned with.
	pub user_type: UserType,

	/// Invitee's full name.
	pub full_name: String,

	/// Contact phone number.
	pub phone: Option<String>,

	/// Department the invitee belongs to.
	pub department_id: Option<String>,

	/// Clinical specialization, if any.
	pub specialization: Option<String>,

	/// Professional license number, if any.
	pub license_number: Option<String>,

	/// The admin who created this entry.
	pub invited_by: AccountId,

	/// Lifecycle state. Monotonic: once terminal, never changes.
	pub status: WhitelistStatus,

	/// The admin who decided this entry. Set exactly once, at the
	/// transition out of `pending`.
	pub approved_by: Option<AccountId>,

	/// When the entry was decided.
	pub approved_at: Option<DateTime<Utc>>,

	/// When the entry was created.
	pub created_at: DateTime<Utc>,

	/// When the entry was last updated.
	pub updated_at: DateTime<Utc>,
}

impl WhitelistEntry {
	/// Create a new pending entry from an invite request.
	///
	/// The email is normalized; descriptive fields are taken as-is.
	pub fn new(request: InviteRequest, invited_by: AccountId) -> Self {
		let now = Utc::now();
		Self {
			id: WhitelistId::generate(),
			email: normalize_email(&request.email),
			user_type: request.user_type,
			full_name: request.full_name.trim().to_string(),
			phone: request.phone,
			department_id: request.department_id,
			specialization: request.specialization,
			license_number: request.license_number,
			invited_by,
			status: WhitelistStatus::Pending,
			approved_by: None,
			approved_at: None,
			created_at: now,
			updated_at: now,
		}
	}

	/// Returns true if a decision can still be made on this entry.
	pub fn is_pending(&self) -> bool {
		self.status.is_pending()
	}
}

/// Normalize an email address for storage and comparison.
///
/// Emails are compared case-insensitively across the whole system, so every
/// read and write path must go through this.
pub fn normalize_email(email: &str) -> String {
	email.trim().to_ascii_lowercase()
}

/// Validates an email address.
///
/// This is shape-checking only (one `@`, non-empty local part and domain,
/// domain contains a dot, no whitespace). Deliverability is not checked.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
	let email = email.trim();
	if email.is_empty() {
		return Err("Email is required");
	}
	if email.chars().any(char::is_whitespace) {
		return Err("Email cannot contain whitespace");
	}
	let Some((local, domain)) = email.split_once('@') else {
		return Err("Email must contain an @");
	};
	if local.is_empty() {
		return Err("Email is missing the part before @");
	}
	if domain.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.')
	{
		return Err("Email domain is invalid");
	}
	if domain.contains('@') {
		return Err("Email must contain exactly one @");
	}
	Ok(())
}
