// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Caller context, roles, and whitelist/profile entities for Triage.
//!
//! This crate holds the types shared by the record-store, identity-store,
//! and provisioning crates: typed ids, the role and status enums, the
//! whitelist and profile entities, and the request-scoped [`AuthContext`].

pub mod context;
pub mod profile;
pub mod types;
pub mod whitelist;

pub use context::{AuthContext, CurrentUser};
pub use profile::Profile;
pub use types::{AccountId, ParseEnumError, UserType, WhitelistId, WhitelistStatus};
pub use whitelist::{normalize_email, validate_email, InviteRequest, WhitelistEntry};
