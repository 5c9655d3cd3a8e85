// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admission guard for the provisioning workflow.
//!
//! Every operation in this crate runs the guard first: resolve the caller
//! from the request context, fetch their role from the profile store, and
//! require `admin`. The guard has no side effects beyond the lookups.

use triage_server_auth::{context::AuthContext, profile::Profile};
use triage_server_db::ProfileStore;

use crate::error::ProvisionError;

/// Resolve the caller and require the admin role.
///
/// # Errors
/// - `Unauthorized` if the context carries no resolved caller.
/// - `Forbidden` if the caller has no profile or is not an admin.
#[tracing::instrument(skip(profiles, ctx))]
pub async fn require_admin(
	profiles: &dyn ProfileStore,
	ctx: &AuthContext,
) -> Result<Profile, ProvisionError> {
	let Some(current_user) = &ctx.current_user else {
		return Err(ProvisionError::Unauthorized);
	};

	let profile = profiles.get_by_account(&current_user.account_id).await?;
	let Some(profile) = profile else {
		tracing::debug!(account_id = %current_user.account_id, "caller has no profile");
		return Err(ProvisionError::Forbidden(
			"admin role required".to_string(),
		));
	};

	if !profile.is_admin() {
		tracing::debug!(account_id = %current_user.account_id, user_type = %profile.user_type, "caller is not an admin");
		return Err(ProvisionError::Forbidden(
			"admin role required".to_string(),
		));
	}

	Ok(profile)
}
