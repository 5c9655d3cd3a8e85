// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Approval orchestrator: the decision state machine for whitelist entries.
//!
//! ```text
//! pending --reject--> rejected   (terminal)
//! pending --approve--> approved  (terminal)
//! ```
//!
//! Approval bridges the identity store and the record store without a
//! shared transaction, so it runs as an ordered saga:
//!
//! 1. create the account (no partial state on failure, safe to retry)
//! 2. insert the profile (compensator: delete the account)
//! 3. flip the entry status (conditional on it still being `pending`)
//!
//! Step 3 is the commit point. If it loses to a concurrent decision the
//! fresh account pair is unwound; if it fails outright the pair is kept and
//! the stale `pending` row is logged for manual reconciliation, since a
//! retry against it would provision a second account.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use triage_server_auth::{
	context::AuthContext,
	profile::Profile,
	types::{AccountId, ParseEnumError, WhitelistId, WhitelistStatus},
	whitelist::WhitelistEntry,
};
use triage_server_db::DbError;
use triage_server_identity::NewAccount;

use crate::admission::require_admin;
use crate::error::ProvisionError;
use crate::ProvisioningService;

/// The decision an admin can make on a pending entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
	/// Provision an account and profile for the invitee.
	Approve,
	/// Decline the invitation. No provisioning happens.
	Reject,
}

impl fmt::Display for DecisionAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DecisionAction::Approve => write!(f, "approve"),
			DecisionAction::Reject => write!(f, "reject"),
		}
	}
}

impl FromStr for DecisionAction {
	type Err = ParseEnumError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"approve" => Ok(DecisionAction::Approve),
			"reject" => Ok(DecisionAction::Reject),
			other => Err(ParseEnumError {
				kind: "decision action",
				value: other.to_string(),
			}),
		}
	}
}

/// The result of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOutcome {
	/// The entry's terminal status.
	pub status: WhitelistStatus,
	/// The provisioned account, present only for approvals.
	pub account_id: Option<AccountId>,
}

impl ProvisioningService {
	/// Decide a pending whitelist entry.
	///
	/// `password` is required for approvals and ignored for rejections.
	///
	/// # Errors
	/// - `Unauthorized` / `Forbidden` from the admission guard.
	/// - `NotFound` if the entry does not exist.
	/// - `InvalidState` if the entry was already decided (including losing
	///   a race to a concurrent decision).
	/// - `InvalidInput` if approval is requested without a password.
	/// - `Provisioning` if account or profile creation failed; the entry
	///   stays `pending` and the call is safe to retry unless the error
	///   flags an orphaned account.
	#[tracing::instrument(skip(self, ctx, password), fields(whitelist_id = %whitelist_id, action = %action))]
	pub async fn decide(
		&self,
		ctx: &AuthContext,
		whitelist_id: &WhitelistId,
		action: DecisionAction,
		password: Option<&str>,
	) -> Result<DecisionOutcome, ProvisionError> {
		let admin = require_admin(self.profiles(), ctx).await?;

		let entry = self
			.whitelist()
			.get_by_id(whitelist_id)
			.await?
			.ok_or_else(|| ProvisionError::NotFound(format!("whitelist entry {whitelist_id}")))?;

		if !entry.is_pending() {
			return Err(ProvisionError::InvalidState {
				status: entry.status,
			});
		}

		match action {
			DecisionAction::Reject => self.reject(&entry, &admin).await,
			DecisionAction::Approve => self.approve(&entry, &admin, password).await,
		}
	}

	/// Reject: one conditional write, no identity or profile side effects.
	async fn reject(
		&self,
		entry: &WhitelistEntry,
		admin: &Profile,
	) -> Result<DecisionOutcome, ProvisionError> {
		match self
			.whitelist()
			.mark_decided(
				&entry.id,
				WhitelistStatus::Rejected,
				&admin.account_id,
				Utc::now(),
			)
			.await
		{
			Ok(()) => {
				tracing::info!(
					whitelist_id = %entry.id,
					rejected_by = %admin.account_id,
					"whitelist entry rejected"
				);
				Ok(DecisionOutcome {
					status: WhitelistStatus::Rejected,
					account_id: None,
				})
			}
			Err(DbError::ConditionFailed(_)) => Err(self.current_state_error(&entry.id).await),
			Err(e) => Err(e.into()),
		}
	}

	/// Approve: account, then profile, then the conditional status flip.
	async fn approve(
		&self,
		entry: &WhitelistEntry,
		admin: &Profile,
		password: Option<&str>,
	) -> Result<DecisionOutcome, ProvisionError> {
		let Some(password) = password.map(str::trim).filter(|p| !p.is_empty()) else {
			return Err(ProvisionError::InvalidInput {
				field: "password",
				message: "A password is required to approve an entry".to_string(),
			});
		};

		// Step 1: the credential. Nothing to unwind if this fails.
		let account = NewAccount::from_entry(entry, password);
		let create = self.identity().create_account(&account);
		let account_id = match tokio::time::timeout(self.config().identity_timeout, create).await {
			Ok(Ok(id)) => id,
			Ok(Err(e)) => {
				tracing::warn!(whitelist_id = %entry.id, error = %e, "account creation failed; entry remains pending");
				return Err(ProvisionError::Provisioning {
					message: "account creation failed".to_string(),
					orphaned_account: None,
				});
			}
			Err(_) => {
				tracing::warn!(whitelist_id = %entry.id, "account creation timed out; entry remains pending");
				return Err(ProvisionError::Provisioning {
					message: "account creation timed out".to_string(),
					orphaned_account: None,
				});
			}
		};

		// Step 2: the profile row. Compensator: delete the account.
		let profile = Profile::from_entry(entry, account_id);
		if let Err(e) = self.profiles().insert(&profile).await {
			tracing::warn!(
				whitelist_id = %entry.id,
				account_id = %account_id,
				error = %e,
				"profile creation failed; deleting just-created account"
			);
			return Err(match self.delete_account_bounded(&account_id).await {
				Ok(()) => ProvisionError::Provisioning {
					message: "profile creation failed; the account was rolled back".to_string(),
					orphaned_account: None,
				},
				Err(delete_err) => {
					tracing::error!(
						whitelist_id = %entry.id,
						account_id = %account_id,
						error = %delete_err,
						"orphaned account: profile creation failed and the compensating deletion also failed"
					);
					ProvisionError::Provisioning {
						message: "profile creation failed and account cleanup also failed"
							.to_string(),
						orphaned_account: Some(account_id),
					}
				}
			});
		}

		// Step 3: the status flip, conditional on the entry still pending.
		match self
			.whitelist()
			.mark_decided(
				&entry.id,
				WhitelistStatus::Approved,
				&admin.account_id,
				Utc::now(),
			)
			.await
		{
			Ok(()) => {
				tracing::info!(
					whitelist_id = %entry.id,
					account_id = %account_id,
					approved_by = %admin.account_id,
					"whitelist entry approved and account provisioned"
				);
				Ok(DecisionOutcome {
					status: WhitelistStatus::Approved,
					account_id: Some(account_id),
				})
			}
			Err(DbError::ConditionFailed(_)) => {
				// Lost to a concurrent decision: unwind the fresh pair so
				// exactly one approval ever keeps an account.
				tracing::warn!(
					whitelist_id = %entry.id,
					account_id = %account_id,
					"entry was decided concurrently; unwinding freshly provisioned account"
				);
				if let Err(e) = self.profiles().delete(&account_id).await {
					tracing::error!(
						whitelist_id = %entry.id,
						account_id = %account_id,
						error = %e,
						"failed to delete profile while unwinding concurrent approval"
					);
				}
				if let Err(e) = self.delete_account_bounded(&account_id).await {
					tracing::error!(
						whitelist_id = %entry.id,
						account_id = %account_id,
						error = %e,
						"orphaned account: failed to delete account while unwinding concurrent approval"
					);
				}
				Err(self.current_state_error(&entry.id).await)
			}
			Err(e) => {
				// The account and profile are live and usable. Retrying the
				// still-pending entry would provision a second account, so
				// this surfaces as success plus a reconciliation log.
				tracing::error!(
					whitelist_id = %entry.id,
					account_id = %account_id,
					error = %e,
					"account and profile are live but the status update failed; entry remains pending and needs manual reconciliation"
				);
				Ok(DecisionOutcome {
					status: WhitelistStatus::Approved,
					account_id: Some(account_id),
				})
			}
		}
	}

	/// Delete an account with the configured timeout, flattening the error
	/// for logging.
	async fn delete_account_bounded(&self, account_id: &AccountId) -> Result<(), String> {
		let delete = self.identity().delete_account(account_id);
		match tokio::time::timeout(self.config().identity_timeout, delete).await {
			Ok(Ok(())) => Ok(()),
			Ok(Err(e)) => Err(e.to_string()),
			Err(_) => Err("identity store timed out".to_string()),
		}
	}

	/// Report the entry's current state after a lost conditional update.
	async fn current_state_error(&self, id: &WhitelistId) -> ProvisionError {
		match self.whitelist().get_by_id(id).await {
			Ok(Some(entry)) => ProvisionError::InvalidState {
				status: entry.status,
			},
			Ok(None) => ProvisionError::NotFound(format!("whitelist entry {id}")),
			Err(e) => e.into(),
		}
	}
}
