// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::HashMap;

use maestro_diff_core::{Epoch, IdentityKey};

/// Per-identity load generation counters.
///
/// A load captures the epoch returned by [`EpochLedger::next_epoch`] before it
/// awaits anything, and checks [`EpochLedger::is_current`] once it resolves.
/// Entries are never removed: resetting a counter would let an old token match
/// again.
#[derive(Debug, Default)]
pub struct EpochLedger {
	epochs: HashMap<IdentityKey, Epoch>,
}

impl EpochLedger {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn next_epoch(&mut self, key: &IdentityKey) -> Epoch {
		let epoch = self.epochs.entry(key.clone()).or_default();
		*epoch = epoch.next();
		*epoch
	}

	pub fn is_current(&self, key: &IdentityKey, epoch: Epoch) -> bool {
		self.current(key) == epoch
	}

	/// Zero for identities that were never loaded.
	pub fn current(&self, key: &IdentityKey) -> Epoch {
		self.epochs.get(key).copied().unwrap_or_default()
	}
}
