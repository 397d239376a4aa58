// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::Arc;

use maestro_diff_core::{
	ChangeSetSnapshot, CheckState, IdentityKey, PathSelection, SelectionCount, SelectionTree,
};
use tokio::sync::watch;
use tracing::trace;

use crate::loader::ChangeSetLoader;
use crate::view::{DiffView, ViewStatus};

/// Selection state of the diff file list, following a loader's view.
///
/// Each identity keeps its own per-path selection, so checkbox choices survive
/// switching away and back as well as refreshes that only add or remove a few
/// files.
pub struct DiffFileList {
	view: watch::Receiver<DiffView>,
	identity: Option<IdentityKey>,
	status: ViewStatus,
	snapshot: Option<Arc<ChangeSetSnapshot>>,
	tree: SelectionTree,
	selections: HashMap<IdentityKey, PathSelection>,
}

impl DiffFileList {
	pub fn new(loader: &ChangeSetLoader) -> Self {
		let mut list = Self {
			view: loader.subscribe(),
			identity: None,
			status: ViewStatus::Idle,
			snapshot: None,
			tree: SelectionTree::new(),
			selections: HashMap::new(),
		};
		list.sync();
		list
	}

	/// Pick up the latest published view. Returns true when the tree was rebuilt.
	pub fn sync(&mut self) -> bool {
		let view = self.view.borrow_and_update().clone();
		self.status = view.status;

		if let (ViewStatus::Missing, Some(key)) = (&self.status, &view.identity) {
			self.selections.remove(key);
		}

		let same_snapshot = match (&view.snapshot, &self.snapshot) {
			(Some(new), Some(old)) => Arc::ptr_eq(new, old),
			(None, None) => true,
			_ => false,
		};
		if view.identity == self.identity && same_snapshot {
			return false;
		}

		self.identity = view.identity;
		self.snapshot = view.snapshot;
		self.tree = match (&self.identity, &self.snapshot) {
			(Some(key), Some(snapshot)) => {
				let selection = self.selections.get(key).cloned().unwrap_or_default();
				let tree = SelectionTree::build(snapshot.files(), selection);
				self.selections.insert(key.clone(), tree.selection().clone());
				trace!(identity = %key, files = snapshot.file_count(), "rebuilt selection tree");
				tree
			}
			_ => SelectionTree::new(),
		};
		true
	}

	/// Wait for the loader to publish a new view, then sync. Returns false once
	/// the loader is gone.
	pub async fn changed(&mut self) -> bool {
		if self.view.changed().await.is_err() {
			return false;
		}
		self.sync();
		true
	}

	pub fn toggle_file(&mut self, path: &str) -> bool {
		let toggled = self.tree.toggle_file(path);
		if toggled {
			self.store_selection();
		}
		toggled
	}

	pub fn toggle_folder(&mut self, path: &str) -> bool {
		let toggled = self.tree.toggle_folder(path);
		if toggled {
			self.store_selection();
		}
		toggled
	}

	pub fn toggle_all(&mut self) {
		self.tree.toggle_all();
		self.store_selection();
	}

	/// Drop the remembered selection for `key`.
	pub fn forget(&mut self, key: &IdentityKey) {
		self.selections.remove(key);
	}

	pub fn identity(&self) -> Option<&IdentityKey> {
		self.identity.as_ref()
	}

	pub fn status(&self) -> &ViewStatus {
		&self.status
	}

	pub fn tree(&self) -> &SelectionTree {
		&self.tree
	}

	pub fn selection_count(&self) -> SelectionCount {
		self.tree.selection_count()
	}

	pub fn master_state(&self) -> CheckState {
		self.tree.master_state()
	}

	/// Selected file paths in list order, for copying review context.
	pub fn selected_paths(&self) -> Vec<String> {
		self.tree
			.selected_paths()
			.into_iter()
			.map(str::to_string)
			.collect()
	}

	fn store_selection(&mut self) {
		if let (Some(key), Some(_)) = (&self.identity, &self.snapshot) {
			self.selections
				.insert(key.clone(), self.tree.selection().clone());
		}
	}
}
