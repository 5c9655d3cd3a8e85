// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Whitelist entry management: invitation and pending-entry reads.
//!
//! An invite is one durable row insertion and touches the identity store
//! not at all. Uniqueness is enforced twice: the lookup here surfaces the
//! blocking entry's status to the caller, and the store's partial unique
//! index wins any insert race.
//!
//! Re-invite policy: an email can be invited again only after a rejection.
//! `pending` and `approved` entries always conflict.

use triage_server_auth::{
	context::AuthContext,
	types::{WhitelistId, WhitelistStatus},
	whitelist::{normalize_email, validate_email, InviteRequest, WhitelistEntry},
};
use triage_server_db::DbError;

use crate::admission::require_admin;
use crate::error::ProvisionError;
use crate::ProvisioningService;

impl ProvisioningService {
	/// Whitelist an email and role for later approval.
	///
	/// # Errors
	/// - `Unauthorized` / `Forbidden` from the admission guard.
	/// - `InvalidInput` if a required field is missing or malformed.
	/// - `Conflict` if the email already has a pending or approved entry;
	///   the existing entry's status is surfaced.
	#[tracing::instrument(skip(self, ctx, request), fields(user_type = %request.user_type))]
	pub async fn invite(
		&self,
		ctx: &AuthContext,
		request: InviteRequest,
	) -> Result<WhitelistEntry, ProvisionError> {
		let admin = require_admin(self.profiles(), ctx).await?;

		validate_email(&request.email).map_err(|message| ProvisionError::InvalidInput {
			field: "email",
			message: message.to_string(),
		})?;
		if request.full_name.trim().is_empty() {
			return Err(ProvisionError::InvalidInput {
				field: "full_name",
				message: "Full name is required".to_string(),
			});
		}

		let email = normalize_email(&request.email);
		if let Some(existing) = self.whitelist().find_blocking_by_email(&email).await? {
			return Err(ProvisionError::Conflict {
				status: existing.status,
			});
		}

		let entry = WhitelistEntry::new(request, admin.account_id);
		match self.whitelist().insert(&entry).await {
			Ok(()) => {
				tracing::info!(
					whitelist_id = %entry.id,
					user_type = %entry.user_type,
					invited_by = %admin.account_id,
					"whitelist entry created"
				);
				Ok(entry)
			}
			// Lost an insert race to a concurrent invite for the same email.
			Err(DbError::Conflict(_)) => Err(ProvisionError::Conflict {
				status: WhitelistStatus::Pending,
			}),
			Err(e) => Err(e.into()),
		}
	}

	/// List all pending whitelist entries, oldest first.
	#[tracing::instrument(skip(self, ctx))]
	pub async fn list_pending(&self, ctx: &AuthContext) -> Result<Vec<WhitelistEntry>, ProvisionError> {
		require_admin(self.profiles(), ctx).await?;
		Ok(self.whitelist().list_pending().await?)
	}

	/// Fetch a single whitelist entry.
	///
	/// # Errors
	/// `NotFound` if no entry exists with this id.
	#[tracing::instrument(skip(self, ctx), fields(whitelist_id = %id))]
	pub async fn get_entry(
		&self,
		ctx: &AuthContext,
		id: &WhitelistId,
	) -> Result<WhitelistEntry, ProvisionError> {
		require_admin(self.profiles(), ctx).await?;
		self
			.whitelist()
			.get_by_id(id)
			.await?
			.ok_or_else(|| ProvisionError::NotFound(format!("whitelist entry {id}")))
	}
}
