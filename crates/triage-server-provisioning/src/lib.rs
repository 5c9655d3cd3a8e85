// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admission guard, whitelist manager, and approval orchestrator for Triage.
//!
//! This crate is the server-side core of the invitation-gated provisioning
//! workflow:
//!
//! - [`admission::require_admin`] - gate every operation on the admin role
//! - [`ProvisioningService::invite`] - whitelist an email and role
//! - [`ProvisioningService::decide`] - approve (provision account + profile)
//!   or reject a pending entry
//!
//! Approval bridges two independent stores. The orchestrator orders its
//! steps so the least-reversible action (creating the credential) happens
//! only after all checks pass, compensates the one step with a cheap
//! compensator (the profile row), and leaves the bookkeeping status flip
//! for last. The status flip is a conditional update, which is what makes
//! concurrent decisions on the same entry safe.

pub mod admission;
pub mod approval;
pub mod config;
pub mod error;
pub mod invite;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use triage_server_db::{ProfileStore, WhitelistStore};
use triage_server_identity::IdentityStore;

pub use approval::{DecisionAction, DecisionOutcome};
pub use config::ProvisioningConfig;
pub use error::ProvisionError;

/// The provisioning service: every operation is request-scoped and carries
/// its own [`triage_server_auth::AuthContext`]; no mutable state is shared
/// between concurrent invocations.
#[derive(Clone)]
pub struct ProvisioningService {
	whitelist: Arc<dyn WhitelistStore>,
	profiles: Arc<dyn ProfileStore>,
	identity: Arc<dyn IdentityStore>,
	config: ProvisioningConfig,
}

impl ProvisioningService {
	/// Create a new service over the given store adapters.
	pub fn new(
		whitelist: Arc<dyn WhitelistStore>,
		profiles: Arc<dyn ProfileStore>,
		identity: Arc<dyn IdentityStore>,
		config: ProvisioningConfig,
	) -> Self {
		Self {
			whitelist,
			profiles,
			identity,
			config,
		}
	}

	pub(crate) fn whitelist(&self) -> &dyn WhitelistStore {
		self.whitelist.as_ref()
	}

	pub(crate) fn profiles(&self) -> &dyn ProfileStore {
		self.profiles.as_ref()
	}

	pub(crate) fn identity(&self) -> &dyn IdentityStore {
		self.identity.as_ref()
	}

	pub(crate) fn config(&self) -> &ProvisioningConfig {
		&self.config
	}
}
