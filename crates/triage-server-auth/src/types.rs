// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for admission and provisioning.
//!
//! This module defines the foundational types used throughout the system:
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs for different entity
//!   types ([`WhitelistId`], [`AccountId`]) preventing accidental mixing
//! - **Role enum**: The closed set of provisionable roles ([`UserType`])
//! - **Status enum**: Whitelist entry lifecycle states ([`WhitelistStatus`])
//!
//! All ID types implement transparent serde serialization (as UUID strings)
//! and provide conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Ok(Self(Uuid::parse_str(s)?))
			}
		}
	};
}

define_id_type!(WhitelistId, "Unique identifier for a whitelist entry.");
define_id_type!(AccountId, "Opaque identifier for an identity-store account.");

// =============================================================================
// User Types
// =============================================================================

/// Error returned when parsing an enum from its string form fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseEnumError {
	/// Which enum failed to parse (e.g. "user type").
	pub kind: &'static str,
	/// The rejected input value.
	pub value: String,
}

/// The closed set of roles an account can be provisioned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
	/// Licensed practitioner with clinical access.
	Doctor,
	/// Non-clinical staff member.
	Staff,
	/// Can invite and approve new accounts.
	Admin,
}

impl UserType {
	/// Returns all provisionable user types.
	pub fn all() -> &'static [UserType] {
		&[UserType::Doctor, UserType::Staff, UserType::Admin]
	}

	/// Returns true if this role may invite and decide whitelist entries.
	pub fn is_admin(&self) -> bool {
		matches!(self, UserType::Admin)
	}
}

impl fmt::Display for UserType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			UserType::Doctor => write!(f, "doctor"),
			UserType::Staff => write!(f, "staff"),
			UserType::Admin => write!(f, "admin"),
		}
	}
}

impl FromStr for UserType {
	type Err = ParseEnumError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"doctor" => Ok(UserType::Doctor),
			"staff" => Ok(UserType::Staff),
			"admin" => Ok(UserType::Admin),
			other => Err(ParseEnumError {
				kind: "user type",
				value: other.to_string(),
			}),
		}
	}
}

// =============================================================================
// Whitelist Status
// =============================================================================

/// Lifecycle state of a whitelist entry.
///
/// `Pending` is the only non-terminal state. Once an entry is `Approved` or
/// `Rejected` it never transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhitelistStatus {
	/// Invited, awaiting an admin decision.
	Pending,
	/// Approved; an account and profile exist for this entry.
	Approved,
	/// Declined; no account was provisioned.
	Rejected,
}

impl WhitelistStatus {
	/// Returns true if a decision can still be made on this entry.
	pub fn is_pending(&self) -> bool {
		matches!(self, WhitelistStatus::Pending)
	}

	/// Returns true if this is a terminal state.
	pub fn is_terminal(&self) -> bool {
		!self.is_pending()
	}
}

impl fmt::Display for WhitelistStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WhitelistStatus::Pending => write!(f, "pending"),
			WhitelistStatus::Approved => write!(f, "approved"),
			WhitelistStatus::Rejected => write!(f, "rejected"),
		}
	}
}

impl FromStr for WhitelistStatus {
	type Err = ParseEnumError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(WhitelistStatus::Pending),
			"approved" => Ok(WhitelistStatus::Approved),
			"rejected" => Ok(WhitelistStatus::Rejected),
			other => Err(ParseEnumError {
				kind: "whitelist status",
				value: other.to_string(),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	mod id_types {
		use super::*;

		#[test]
		fn whitelist_id_roundtrips() {
			let uuid = Uuid::new_v4();
			let id = WhitelistId::new(uuid);
			assert_eq!(id.into_inner(), uuid);
		}

		#[test]
		fn whitelist_id_generates_unique() {
			let id1 = WhitelistId::generate();
			let id2 = WhitelistId::generate();
			assert_ne!(id1, id2);
		}

		#[test]
		fn account_id_serializes_as_uuid() {
			let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
			let id = AccountId::new(uuid);
			let json = serde_json::to_string(&id).unwrap();
			assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
		}

		#[test]
		fn account_id_parses_from_str() {
			let id: AccountId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
			assert_eq!(
				id.into_inner(),
				Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap()
			);
		}

		proptest! {
				#[test]
				fn whitelist_id_roundtrip_any_uuid(
						a: u128
				) {
						let uuid = Uuid::from_u128(a);
						let id = WhitelistId::new(uuid);
						prop_assert_eq!(id.into_inner(), uuid);
						prop_assert_eq!(Uuid::from(id), uuid);
				}

				#[test]
				fn account_id_display_matches_uuid(
						a: u128
				) {
						let uuid = Uuid::from_u128(a);
						let id = AccountId::new(uuid);
						prop_assert_eq!(id.to_string(), uuid.to_string());
				}
		}
	}

	mod user_type {
		use super::*;

		#[test]
		fn parses_all_variants() {
			for ut in UserType::all() {
				let parsed: UserType = ut.to_string().parse().unwrap();
				assert_eq!(parsed, *ut);
			}
		}

		#[test]
		fn rejects_unknown_value() {
			let err = "nurse".parse::<UserType>().unwrap_err();
			assert_eq!(err.value, "nurse");
		}

		#[test]
		fn only_admin_is_admin() {
			assert!(UserType::Admin.is_admin());
			assert!(!UserType::Doctor.is_admin());
			assert!(!UserType::Staff.is_admin());
		}

		#[test]
		fn serializes_snake_case() {
			let json = serde_json::to_string(&UserType::Doctor).unwrap();
			assert_eq!(json, "\"doctor\"");
		}
	}

	mod whitelist_status {
		use super::*;

		#[test]
		fn pending_is_only_non_terminal_state() {
			assert!(WhitelistStatus::Pending.is_pending());
			assert!(!WhitelistStatus::Pending.is_terminal());
			assert!(WhitelistStatus::Approved.is_terminal());
			assert!(WhitelistStatus::Rejected.is_terminal());
		}

		#[test]
		fn display_roundtrips_through_parse() {
			for status in [
				WhitelistStatus::Pending,
				WhitelistStatus::Approved,
				WhitelistStatus::Rejected,
			] {
				let parsed: WhitelistStatus = status.to_string().parse().unwrap();
				assert_eq!(parsed, status);
			}
		}

		#[test]
		fn rejects_unknown_value() {
			assert!("revoked".parse::<WhitelistStatus>().is_err());
		}
	}
}
