// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use maestro_diff_core::{ChangeSetSnapshot, IdentityKey};

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Last committed snapshot per identity.
///
/// Bounded by insertion order: once full, committing a new identity evicts the
/// one committed longest ago. Re-committing an identity refreshes its position.
#[derive(Debug)]
pub struct ChangeSetCache {
	entries: HashMap<IdentityKey, Arc<ChangeSetSnapshot>>,
	order: VecDeque<IdentityKey>,
	capacity: usize,
}

impl Default for ChangeSetCache {
	fn default() -> Self {
		Self::new(DEFAULT_CACHE_CAPACITY)
	}
}

impl ChangeSetCache {
	/// A `capacity` of zero disables eviction.
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: HashMap::new(),
			order: VecDeque::new(),
			capacity,
		}
	}

	pub fn get(&self, key: &IdentityKey) -> Option<Arc<ChangeSetSnapshot>> {
		self.entries.get(key).cloned()
	}

	pub fn contains(&self, key: &IdentityKey) -> bool {
		self.entries.contains_key(key)
	}

	pub fn set(&mut self, key: IdentityKey, snapshot: Arc<ChangeSetSnapshot>) {
		if self.entries.insert(key.clone(), snapshot).is_some() {
			self.order.retain(|k| k != &key);
		}
		self.order.push_back(key);

		if self.capacity == 0 {
			return;
		}
		while self.entries.len() > self.capacity {
			let Some(oldest) = self.order.pop_front() else {
				break;
			};
			self.entries.remove(&oldest);
		}
	}

	pub fn invalidate(&mut self, key: &IdentityKey) -> bool {
		if self.entries.remove(key).is_some() {
			self.order.retain(|k| k != key);
			true
		} else {
			false
		}
	}

	/// Drop every entry belonging to `project_path`. Returns how many were removed.
	pub fn invalidate_project(&mut self, project_path: &Path) -> usize {
		let before = self.entries.len();
		self.entries.retain(|key, _| !key.belongs_to(project_path));
		self.order.retain(|key| !key.belongs_to(project_path));
		before - self.entries.len()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
