// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request-scoped caller context.
//!
//! Authentication itself happens upstream (transport layer, out of scope
//! here); what arrives at the core is an [`AuthContext`] carrying the
//! resolved caller, injected per call. There is no process-wide session
//! state: every operation receives its own context.

use serde::{Deserialize, Serialize};

use crate::types::AccountId;

/// The authenticated caller, as resolved by the upstream auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
	/// The caller's identity-store account.
	pub account_id: AccountId,
}

impl CurrentUser {
	/// Create a caller from a resolved account id.
	pub fn new(account_id: AccountId) -> Self {
		Self { account_id }
	}
}

/// Authentication context for request processing.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
	/// The current caller, if authenticated.
	pub current_user: Option<CurrentUser>,
}

impl AuthContext {
	/// Create a new unauthenticated context.
	pub fn unauthenticated() -> Self {
		Self { current_user: None }
	}

	/// Create a new authenticated context.
	pub fn authenticated(current_user: CurrentUser) -> Self {
		Self {
			current_user: Some(current_user),
		}
	}

	/// Returns true if the request carries a resolved caller.
	pub fn is_authenticated(&self) -> bool {
		self.current_user.is_some()
	}
}
