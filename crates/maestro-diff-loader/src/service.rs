// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use maestro_diff_core::{ChangeSetSnapshot, Epoch, IdentityKey};
use parking_lot::{Mutex, MutexGuard};

use crate::cache::ChangeSetCache;
use crate::epoch::EpochLedger;

/// Where an identity's most recent load attempt stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadPhase {
	#[default]
	Idle,
	Loading,
	Settled,
	/// The load resolved after a pushed payload replaced its data, and its
	/// result was thrown away.
	StaleDiscarded,
}

/// Shared bookkeeping for every loader bound to one window.
///
/// Cloning is cheap and clones share state. All mutations go through one
/// mutex that is never held across an await point.
#[derive(Clone, Default)]
pub struct DiffCacheService {
	state: Arc<Mutex<ServiceState>>,
}

impl DiffCacheService {
	pub fn new(cache_capacity: usize) -> Self {
		Self {
			state: Arc::new(Mutex::new(ServiceState::new(cache_capacity))),
		}
	}

	pub(crate) fn lock(&self) -> MutexGuard<'_, ServiceState> {
		self.state.lock()
	}

	pub fn snapshot(&self, key: &IdentityKey) -> Option<Arc<ChangeSetSnapshot>> {
		self.lock().cache.get(key)
	}

	pub fn phase(&self, key: &IdentityKey) -> LoadPhase {
		self.lock().phase(key)
	}

	pub fn current_epoch(&self, key: &IdentityKey) -> Epoch {
		self.lock().epochs.current(key)
	}

	pub fn active_identity(&self) -> Option<IdentityKey> {
		self.lock().active.clone()
	}

	pub fn is_missing(&self, key: &IdentityKey) -> bool {
		self.lock().missing.contains(key)
	}

	/// An invalidation arrived while a load was in flight; one more load runs
	/// once it settles.
	pub fn refresh_queued(&self, key: &IdentityKey) -> bool {
		self.lock().dirty.contains(key)
	}

	pub fn cached_count(&self) -> usize {
		self.lock().cache.len()
	}
}

#[derive(Debug, Default)]
pub(crate) struct ServiceState {
	pub(crate) epochs: EpochLedger,
	pub(crate) cache: ChangeSetCache,
	phases: HashMap<IdentityKey, LoadPhase>,
	/// Identities whose last load reported them gone. Cleared by invalidation.
	missing: HashSet<IdentityKey>,
	/// Invalidated while loading.
	dirty: HashSet<IdentityKey>,
	active: Option<IdentityKey>,
}

impl ServiceState {
	fn new(cache_capacity: usize) -> Self {
		Self {
			cache: ChangeSetCache::new(cache_capacity),
			..Self::default()
		}
	}

	pub(crate) fn phase(&self, key: &IdentityKey) -> LoadPhase {
		self.phases.get(key).copied().unwrap_or_default()
	}

	pub(crate) fn is_loading(&self, key: &IdentityKey) -> bool {
		self.phase(key) == LoadPhase::Loading
	}

	pub(crate) fn is_active(&self, key: &IdentityKey) -> bool {
		self.active.as_ref() == Some(key)
	}

	/// Returns the previously active identity.
	pub(crate) fn set_active(&mut self, key: Option<IdentityKey>) -> Option<IdentityKey> {
		std::mem::replace(&mut self.active, key)
	}

	/// Start a load unless one is already in flight for `key`.
	///
	/// Only [`ServiceState::finish`] takes a key out of `Loading`, so at most
	/// one fetch per key is ever outstanding.
	pub(crate) fn begin_load(&mut self, key: &IdentityKey) -> Option<Epoch> {
		if self.is_loading(key) {
			return None;
		}
		let epoch = self.epochs.next_epoch(key);
		self.phases.insert(key.clone(), LoadPhase::Loading);
		Some(epoch)
	}

	/// Settle the in-flight load for `key`. Returns false when a pushed payload
	/// made `epoch` stale.
	pub(crate) fn finish(&mut self, key: &IdentityKey, epoch: Epoch) -> bool {
		let current = self.epochs.is_current(key, epoch);
		let phase = if current {
			LoadPhase::Settled
		} else {
			LoadPhase::StaleDiscarded
		};
		self.phases.insert(key.clone(), phase);
		current
	}

	/// Queue one more load for `key` if a load is in flight. Returns whether
	/// it was queued.
	pub(crate) fn mark_dirty(&mut self, key: &IdentityKey) -> bool {
		if !self.is_loading(key) {
			return false;
		}
		self.dirty.insert(key.clone());
		true
	}

	pub(crate) fn take_dirty(&mut self, key: &IdentityKey) -> bool {
		self.dirty.remove(key)
	}

	/// Record a payload that arrived without a load. An in-flight load stays
	/// in flight but its result becomes stale.
	pub(crate) fn settle_pushed(&mut self, key: &IdentityKey) -> Epoch {
		let epoch = self.epochs.next_epoch(key);
		if !self.is_loading(key) {
			self.phases.insert(key.clone(), LoadPhase::Settled);
		}
		self.missing.remove(key);
		self.dirty.remove(key);
		epoch
	}

	pub(crate) fn is_missing(&self, key: &IdentityKey) -> bool {
		self.missing.contains(key)
	}

	pub(crate) fn mark_missing(&mut self, key: &IdentityKey) {
		self.cache.invalidate(key);
		self.missing.insert(key.clone());
	}

	pub(crate) fn clear_missing(&mut self, key: &IdentityKey) -> bool {
		self.missing.remove(key)
	}

	/// Drop cached snapshots and missing marks of every identity in
	/// `project_path`. Returns how many snapshots were dropped.
	pub(crate) fn invalidate_project(&mut self, project_path: &Path) -> usize {
		self.missing.retain(|key| !key.belongs_to(project_path));
		self.cache.invalidate_project(project_path)
	}
}
