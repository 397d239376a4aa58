// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use maestro_diff_core::{ChangeSetSnapshot, ChangedFile, IdentityKey};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ViewStatus {
	/// Nothing selected.
	#[default]
	Idle,
	/// Fetching with nothing to show yet.
	Loading,
	/// Showing a cached snapshot while a fresh one is fetched.
	Refreshing,
	Ready,
	/// The identity no longer exists.
	Missing,
	Failed {
		message: String,
	},
}

/// What the diff panel shows right now.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiffView {
	pub identity: Option<IdentityKey>,
	pub status: ViewStatus,
	pub snapshot: Option<Arc<ChangeSetSnapshot>>,
}

impl DiffView {
	pub fn idle() -> Self {
		Self::default()
	}

	pub fn loading(identity: IdentityKey) -> Self {
		Self::with(identity, ViewStatus::Loading, None)
	}

	pub fn refreshing(identity: IdentityKey, snapshot: Arc<ChangeSetSnapshot>) -> Self {
		Self::with(identity, ViewStatus::Refreshing, Some(snapshot))
	}

	pub fn ready(identity: IdentityKey, snapshot: Arc<ChangeSetSnapshot>) -> Self {
		Self::with(identity, ViewStatus::Ready, Some(snapshot))
	}

	pub fn missing(identity: IdentityKey) -> Self {
		Self::with(identity, ViewStatus::Missing, None)
	}

	pub fn failed(identity: IdentityKey, message: impl Into<String>) -> Self {
		Self::with(
			identity,
			ViewStatus::Failed {
				message: message.into(),
			},
			None,
		)
	}

	fn with(
		identity: IdentityKey,
		status: ViewStatus,
		snapshot: Option<Arc<ChangeSetSnapshot>>,
	) -> Self {
		Self {
			identity: Some(identity),
			status,
			snapshot,
		}
	}

	/// Files on screen; empty while loading or after a failure.
	pub fn files(&self) -> &[ChangedFile] {
		self.snapshot.as_deref().map(ChangeSetSnapshot::files).unwrap_or(&[])
	}

	pub fn is_loading(&self) -> bool {
		matches!(self.status, ViewStatus::Loading | ViewStatus::Refreshing)
	}

	pub fn is_showing(&self, key: &IdentityKey) -> bool {
		self.identity.as_ref() == Some(key)
	}
}
