// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory identity store with failure injection for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use triage_server_auth::types::AccountId;

use crate::{IdentityError, IdentityStore, NewAccount};

/// An in-memory [`IdentityStore`].
///
/// Supports one-shot failure injection on either operation so orchestrator
/// tests can exercise each compensation branch, and exposes counters for
/// asserting exactly how many accounts were ever created or deleted.
#[derive(Default)]
pub struct InMemoryIdentityStore {
	accounts: Mutex<HashMap<AccountId, NewAccount>>,
	fail_next_create: AtomicBool,
	fail_next_delete: AtomicBool,
	created_total: AtomicUsize,
	deleted_total: AtomicUsize,
}

impl InMemoryIdentityStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Make the next `create_account` call fail with `Unavailable`.
	pub fn fail_next_create(&self) {
		self.fail_next_create.store(true, Ordering::SeqCst);
	}

	/// Make the next `delete_account` call fail with `Unavailable`.
	pub fn fail_next_delete(&self) {
		self.fail_next_delete.store(true, Ordering::SeqCst);
	}

	/// Number of accounts currently stored.
	pub fn account_count(&self) -> usize {
		self.accounts.lock().unwrap().len()
	}

	/// Returns true if the account currently exists.
	pub fn contains(&self, id: &AccountId) -> bool {
		self.accounts.lock().unwrap().contains_key(id)
	}

	/// Get a stored account by id.
	pub fn get(&self, id: &AccountId) -> Option<NewAccount> {
		self.accounts.lock().unwrap().get(id).cloned()
	}

	/// Total accounts ever created, including later-deleted ones.
	pub fn created_total(&self) -> usize {
		self.created_total.load(Ordering::SeqCst)
	}

	/// Total accounts ever deleted.
	pub fn deleted_total(&self) -> usize {
		self.deleted_total.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
	async fn create_account(&self, account: &NewAccount) -> Result<AccountId, IdentityError> {
		if self.fail_next_create.swap(false, Ordering::SeqCst) {
			return Err(IdentityError::Unavailable("injected create failure".to_string()));
		}

		let mut accounts = self.accounts.lock().unwrap();
		if accounts.values().any(|a| a.email == account.email) {
			return Err(IdentityError::Duplicate(account.email.clone()));
		}

		let id = AccountId::generate();
		accounts.insert(id, account.clone());
		self.created_total.fetch_add(1, Ordering::SeqCst);
		Ok(id)
	}

	async fn delete_account(&self, id: &AccountId) -> Result<(), IdentityError> {
		if self.fail_next_delete.swap(false, Ordering::SeqCst) {
			return Err(IdentityError::Unavailable("injected delete failure".to_string()));
		}

		let mut accounts = self.accounts.lock().unwrap();
		if accounts.remove(id).is_none() {
			return Err(IdentityError::NotFound(id.to_string()));
		}
		self.deleted_total.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}
