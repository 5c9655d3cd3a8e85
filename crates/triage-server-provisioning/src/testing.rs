// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared test fixtures for the provisioning crate.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;

use triage_server_auth::{
	context::{AuthContext, CurrentUser},
	profile::Profile,
	types::{AccountId, UserType},
};
use triage_server_db::{
	testing::create_provisioning_test_pool, ProfileRepository, WhitelistRepository,
};
use triage_server_identity::testing::InMemoryIdentityStore;

use crate::{ProvisioningConfig, ProvisioningService};

pub(crate) struct TestHarness {
	pub service: ProvisioningService,
	pub identity: Arc<InMemoryIdentityStore>,
	pub whitelist: WhitelistRepository,
	pub profiles: ProfileRepository,
	pub pool: SqlitePool,
	pub admin_ctx: AuthContext,
	pub doctor_ctx: AuthContext,
	pub admin_id: AccountId,
}

/// Insert a profile for a caller of the given role and return its context.
async fn seed_caller(profiles: &ProfileRepository, user_type: UserType) -> AuthContext {
	let account_id = AccountId::generate();
	let now = Utc::now();
	profiles
		.insert(&Profile {
			account_id,
			email: format!("{user_type}-{account_id}@clinic.example.org"),
			user_type,
			full_name: "Seeded Caller".to_string(),
			phone: None,
			department_id: None,
			specialization: None,
			license_number: None,
			created_at: now,
			updated_at: now,
		})
		.await
		.unwrap();
	AuthContext::authenticated(CurrentUser::new(account_id))
}

pub(crate) async fn make_service() -> TestHarness {
	let pool = create_provisioning_test_pool().await;
	let whitelist = WhitelistRepository::new(pool.clone());
	let profiles = ProfileRepository::new(pool.clone());
	let identity = Arc::new(InMemoryIdentityStore::new());

	let admin_ctx = seed_caller(&profiles, UserType::Admin).await;
	let doctor_ctx = seed_caller(&profiles, UserType::Doctor).await;
	let admin_id = admin_ctx.current_user.unwrap().account_id;

	let service = ProvisioningService::new(
		Arc::new(whitelist.clone()),
		Arc::new(profiles.clone()),
		identity.clone(),
		ProvisioningConfig::default(),
	);

	TestHarness {
		service,
		identity,
		whitelist,
		profiles,
		pool,
		admin_ctx,
		doctor_ctx,
		admin_id,
	}
}
