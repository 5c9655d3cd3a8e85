// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the provisioning workflow.

use std::time::Duration;

use crate::error::ProvisionError;

/// Environment variable overriding the identity-store call timeout, in seconds.
pub const IDENTITY_TIMEOUT_ENV_VAR: &str = "TRIAGE_SERVER_IDENTITY_TIMEOUT_SECS";

const DEFAULT_IDENTITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration for [`crate::ProvisioningService`].
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
	/// Upper bound on every identity-store call. A timeout during account
	/// creation is treated like any other provisioning failure.
	pub identity_timeout: Duration,
}

impl Default for ProvisioningConfig {
	fn default() -> Self {
		Self {
			identity_timeout: DEFAULT_IDENTITY_TIMEOUT,
		}
	}
}

impl ProvisioningConfig {
	/// Load configuration from environment variables.
	///
	/// Environment variables:
	/// - `TRIAGE_SERVER_IDENTITY_TIMEOUT_SECS` - identity-store call timeout
	///   in whole seconds (default: 10)
	pub fn from_env() -> Result<Self, ProvisionError> {
		let identity_timeout = match std::env::var(IDENTITY_TIMEOUT_ENV_VAR) {
			Ok(value) => Self::timeout_from_env_value(&value)?,
			Err(std::env::VarError::NotPresent) => DEFAULT_IDENTITY_TIMEOUT,
			Err(e) => {
				return Err(ProvisionError::Configuration(format!(
					"Failed to read {IDENTITY_TIMEOUT_ENV_VAR}: {e}"
				)))
			}
		};

		Ok(Self { identity_timeout })
	}

	/// Parse a timeout from an environment variable value.
	fn timeout_from_env_value(value: &str) -> Result<Duration, ProvisionError> {
		let secs: u64 = value.trim().parse().map_err(|e| {
			ProvisionError::Configuration(format!(
				"Invalid {IDENTITY_TIMEOUT_ENV_VAR} value '{value}': {e}"
			))
		})?;
		if secs == 0 {
			return Err(ProvisionError::Configuration(format!(
				"{IDENTITY_TIMEOUT_ENV_VAR} must be greater than zero"
			)));
		}
		Ok(Duration::from_secs(secs))
	}
}
