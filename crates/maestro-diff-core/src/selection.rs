// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Folder/file hierarchy with tri-state checkboxes.
//!
//! The only persisted state is [`PathSelection`], a set of selected file paths.
//! Every node's [`CheckState`] is recomputed from that set after each change,
//! so a folder can never disagree with its descendants. The tree structure is
//! rebuilt from scratch whenever a new file list arrives.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::model::ChangedFile;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CheckState {
	Checked,
	#[default]
	Unchecked,
	Indeterminate,
}

impl CheckState {
	/// Derive the state of a group with `selected` of `total` files selected.
	pub fn from_counts(selected: usize, total: usize) -> Self {
		if selected == 0 || total == 0 {
			Self::Unchecked
		} else if selected >= total {
			Self::Checked
		} else {
			Self::Indeterminate
		}
	}

	pub fn is_checked(self) -> bool {
		self == Self::Checked
	}

	pub fn is_indeterminate(self) -> bool {
		self == Self::Indeterminate
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionCount {
	pub selected: usize,
	pub total: usize,
}

impl fmt::Display for SelectionCount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({}/{})", self.selected, self.total)
	}
}

/// Selected file paths, plus the paths seen so far.
///
/// Paths seen for the first time start selected. A path the user deselected
/// stays deselected across refreshes for as long as it keeps appearing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathSelection {
	selected: HashSet<String>,
	known: HashSet<String>,
}

impl PathSelection {
	pub fn new() -> Self {
		Self::default()
	}

	/// Align with the current file list: select new paths, forget vanished ones.
	pub fn reconcile<'a>(&mut self, paths: impl IntoIterator<Item = &'a str>) {
		let current: HashSet<&str> = paths.into_iter().collect();

		for path in &current {
			if self.known.insert((*path).to_string()) {
				self.selected.insert((*path).to_string());
			}
		}

		self.known.retain(|p| current.contains(p.as_str()));
		self.selected.retain(|p| current.contains(p.as_str()));
	}

	pub fn is_selected(&self, path: &str) -> bool {
		self.selected.contains(path)
	}

	pub fn set(&mut self, path: &str, selected: bool) {
		if selected {
			self.selected.insert(path.to_string());
		} else {
			self.selected.remove(path);
		}
	}

	pub fn len(&self) -> usize {
		self.selected.len()
	}

	pub fn is_empty(&self) -> bool {
		self.selected.is_empty()
	}
}

/// A node of the selection tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionNode {
	File {
		path: String,
		name: String,
		state: CheckState,
	},
	Folder {
		path: String,
		name: String,
		children: Vec<SelectionNode>,
		state: CheckState,
	},
}

impl SelectionNode {
	pub fn path(&self) -> &str {
		match self {
			Self::File { path, .. } | Self::Folder { path, .. } => path,
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Self::File { name, .. } | Self::Folder { name, .. } => name,
		}
	}

	pub fn state(&self) -> CheckState {
		match self {
			Self::File { state, .. } | Self::Folder { state, .. } => *state,
		}
	}

	pub fn checked(&self) -> bool {
		self.state().is_checked()
	}

	pub fn indeterminate(&self) -> bool {
		self.state().is_indeterminate()
	}

	pub fn is_folder(&self) -> bool {
		matches!(self, Self::Folder { .. })
	}

	pub fn children(&self) -> &[SelectionNode] {
		match self {
			Self::File { .. } => &[],
			Self::Folder { children, .. } => children,
		}
	}

	fn collect_files<'a>(&'a self, out: &mut Vec<&'a str>) {
		match self {
			Self::File { path, .. } => out.push(path),
			Self::Folder { children, .. } => {
				for child in children {
					child.collect_files(out);
				}
			}
		}
	}

	/// Recompute this node's state; returns `(selected, total)` file counts.
	fn refresh(&mut self, selection: &PathSelection) -> (usize, usize) {
		match self {
			Self::File { path, state, .. } => {
				let on = selection.is_selected(path);
				*state = if on {
					CheckState::Checked
				} else {
					CheckState::Unchecked
				};
				(usize::from(on), 1)
			}
			Self::Folder {
				children, state, ..
			} => {
				let (selected, total) = refresh_all(children, selection);
				*state = CheckState::from_counts(selected, total);
				(selected, total)
			}
		}
	}
}

fn refresh_all(nodes: &mut [SelectionNode], selection: &PathSelection) -> (usize, usize) {
	nodes.iter_mut().fold((0, 0), |(sel, tot), node| {
		let (s, t) = node.refresh(selection);
		(sel + s, tot + t)
	})
}

/// A file and a folder may share a path, so lookups say which one they want.
fn find_node<'a, F>(nodes: &'a [SelectionNode], path: &str, wanted: F) -> Option<&'a SelectionNode>
where
	F: Fn(&SelectionNode) -> bool + Copy,
{
	for node in nodes {
		if node.path() == path && wanted(node) {
			return Some(node);
		}
		if let SelectionNode::Folder { children, .. } = node {
			let prefix = format!("{}/", node.path());
			if path.starts_with(&prefix) {
				if let Some(found) = find_node(children, path, wanted) {
					return Some(found);
				}
			}
		}
	}
	None
}

#[derive(Default)]
struct FolderBuilder {
	folders: BTreeMap<String, FolderBuilder>,
	files: BTreeMap<String, String>,
}

impl FolderBuilder {
	fn insert(&mut self, segments: &[&str], full_path: &str) {
		match segments {
			[] => {}
			[file] => {
				self.files.insert((*file).to_string(), full_path.to_string());
			}
			[folder, rest @ ..] => self
				.folders
				.entry((*folder).to_string())
				.or_default()
				.insert(rest, full_path),
		}
	}

	fn into_nodes(self, prefix: &str) -> Vec<SelectionNode> {
		let mut nodes = Vec::with_capacity(self.folders.len() + self.files.len());

		for (name, folder) in self.folders {
			let path = if prefix.is_empty() {
				name.clone()
			} else {
				format!("{prefix}/{name}")
			};
			let children = folder.into_nodes(&path);
			nodes.push(SelectionNode::Folder {
				path,
				name,
				children,
				state: CheckState::Unchecked,
			});
		}

		for (name, path) in self.files {
			nodes.push(SelectionNode::File {
				path,
				name,
				state: CheckState::Unchecked,
			});
		}

		nodes
	}
}

/// Tri-state selection over a change set's files.
#[derive(Clone, Debug, Default)]
pub struct SelectionTree {
	files: Vec<String>,
	roots: Vec<SelectionNode>,
	selection: PathSelection,
	master: CheckState,
}

impl SelectionTree {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn build(files: &[ChangedFile], selection: PathSelection) -> Self {
		let mut tree = Self {
			selection,
			..Self::default()
		};
		tree.rebuild(files);
		tree
	}

	/// Replace the structure with one derived from `files`, keeping the
	/// per-path selection.
	pub fn rebuild(&mut self, files: &[ChangedFile]) {
		let mut seen = HashSet::new();
		self.files = files
			.iter()
			.filter(|f| seen.insert(f.path.as_str()))
			.map(|f| f.path.clone())
			.collect();

		self.selection
			.reconcile(self.files.iter().map(String::as_str));

		let mut builder = FolderBuilder::default();
		for path in &self.files {
			let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
			builder.insert(&segments, path);
		}
		self.roots = builder.into_nodes("");
		self.refresh();
	}

	/// Flip one file. Returns `false` when the path is not in the tree.
	pub fn toggle_file(&mut self, path: &str) -> bool {
		match find_node(&self.roots, path, |node| !node.is_folder()) {
			Some(_) => {
				let on = self.selection.is_selected(path);
				self.selection.set(path, !on);
				self.refresh();
				true
			}
			_ => false,
		}
	}

	/// Clear a checked or indeterminate folder; fill an unchecked one.
	/// Returns `false` when `path` is not a folder in the tree.
	pub fn toggle_folder(&mut self, path: &str) -> bool {
		let Some(node) = find_node(&self.roots, path, SelectionNode::is_folder) else {
			return false;
		};

		let turn_on = node.state() == CheckState::Unchecked;
		let mut descendants = Vec::new();
		node.collect_files(&mut descendants);
		let descendants: Vec<String> = descendants.into_iter().map(str::to_string).collect();

		for file in &descendants {
			self.selection.set(file, turn_on);
		}
		self.refresh();
		true
	}

	/// Master checkbox: same rule as [`Self::toggle_folder`] over every file.
	pub fn toggle_all(&mut self) {
		let turn_on = self.master == CheckState::Unchecked;
		for file in &self.files {
			self.selection.set(file, turn_on);
		}
		self.refresh();
	}

	pub fn selection_count(&self) -> SelectionCount {
		SelectionCount {
			selected: self
				.files
				.iter()
				.filter(|f| self.selection.is_selected(f))
				.count(),
			total: self.files.len(),
		}
	}

	pub fn master_state(&self) -> CheckState {
		self.master
	}

	pub fn roots(&self) -> &[SelectionNode] {
		&self.roots
	}

	pub fn node(&self, path: &str) -> Option<&SelectionNode> {
		find_node(&self.roots, path, |_| true)
	}

	pub fn is_selected(&self, path: &str) -> bool {
		self.selection.is_selected(path)
	}

	/// Selected paths in change-set order.
	pub fn selected_paths(&self) -> Vec<&str> {
		self.files
			.iter()
			.filter(|f| self.selection.is_selected(f))
			.map(String::as_str)
			.collect()
	}

	pub fn selection(&self) -> &PathSelection {
		&self.selection
	}

	pub fn into_selection(self) -> PathSelection {
		self.selection
	}

	fn refresh(&mut self) {
		let (selected, total) = refresh_all(&mut self.roots, &self.selection);
		self.master = CheckState::from_counts(selected, total);
	}
}
