// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error taxonomy for the provisioning workflow.
//!
//! Every failure carries a machine-readable kind ([`ProvisionError::kind`])
//! and a caller-safe message; raw store errors stay in the wrapped source
//! and are never interpolated into caller-facing text.

use http::StatusCode;
use triage_server_auth::types::{AccountId, WhitelistStatus};
use triage_server_db::DbError;

/// Errors that can occur during invitation and approval.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
	#[error("authentication required")]
	Unauthorized,

	#[error("forbidden: {0}")]
	Forbidden(String),

	#[error("invalid {field}: {message}")]
	InvalidInput {
		field: &'static str,
		message: String,
	},

	#[error("not found: {0}")]
	NotFound(String),

	#[error("a whitelist entry for this email already exists ({status})")]
	Conflict { status: WhitelistStatus },

	#[error("entry has already been decided ({status})")]
	InvalidState { status: WhitelistStatus },

	#[error("storage operation failed")]
	Storage(#[from] DbError),

	#[error("provisioning failed: {message}")]
	Provisioning {
		message: String,
		/// Set when compensation failed and a credentialed account now
		/// exists without a profile. Requires operator intervention.
		orphaned_account: Option<AccountId>,
	},

	#[error("configuration error: {0}")]
	Configuration(String),
}

impl ProvisionError {
	/// Machine-readable error kind for response serialization.
	pub fn kind(&self) -> &'static str {
		match self {
			ProvisionError::Unauthorized => "unauthorized",
			ProvisionError::Forbidden(_) => "forbidden",
			ProvisionError::InvalidInput { .. } => "invalid_input",
			ProvisionError::NotFound(_) => "not_found",
			ProvisionError::Conflict { .. } => "conflict",
			ProvisionError::InvalidState { .. } => "invalid_state",
			ProvisionError::Storage(_) => "storage_error",
			ProvisionError::Provisioning { .. } => "provisioning_error",
			ProvisionError::Configuration(_) => "configuration_error",
		}
	}

	/// The HTTP status a routing layer should map this error to.
	pub fn status_code(&self) -> StatusCode {
		match self {
			ProvisionError::Unauthorized => StatusCode::UNAUTHORIZED,
			ProvisionError::Forbidden(_) => StatusCode::FORBIDDEN,
			ProvisionError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
			ProvisionError::NotFound(_) => StatusCode::NOT_FOUND,
			ProvisionError::Conflict { .. } | ProvisionError::InvalidState { .. } => {
				StatusCode::CONFLICT
			}
			ProvisionError::Storage(_)
			| ProvisionError::Provisioning { .. }
			| ProvisionError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// The orphaned account id, if this failure left one behind.
	pub fn orphaned_account(&self) -> Option<AccountId> {
		match self {
			ProvisionError::Provisioning {
				orphaned_account, ..
			} => *orphaned_account,
			_ => None,
		}
	}
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
