// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generation counter for one identity's load attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(u64);

impl Epoch {
	pub const ZERO: Epoch = Epoch(0);

	pub fn new(value: u64) -> Self {
		Self(value)
	}

	pub fn get(self) -> u64 {
		self.0
	}

	pub fn next(self) -> Self {
		Self(self.0.saturating_add(1))
	}
}

impl fmt::Display for Epoch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
	Modified,
	Added,
	Deleted,
	Renamed,
	Copied,
	#[default]
	#[serde(other)]
	Unknown,
}

impl ChangeType {
	/// Map a git status letter (`M`, `A`, `D`, `R100`, `C75`, ...) to a change type.
	pub fn from_status_code(code: &str) -> Self {
		match code.trim().chars().next() {
			Some('M') => Self::Modified,
			Some('A') => Self::Added,
			Some('D') => Self::Deleted,
			Some('R') => Self::Renamed,
			Some('C') => Self::Copied,
			_ => Self::Unknown,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Modified => "modified",
			Self::Added => "added",
			Self::Deleted => "deleted",
			Self::Renamed => "renamed",
			Self::Copied => "copied",
			Self::Unknown => "unknown",
		}
	}
}

impl fmt::Display for ChangeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Diff stat for a single changed file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
	pub path: String,
	#[serde(default)]
	pub change_type: ChangeType,
	#[serde(default)]
	pub additions: u32,
	#[serde(default)]
	pub deletions: u32,
	#[serde(default)]
	pub is_binary: bool,
}

impl ChangedFile {
	pub fn new(path: impl Into<String>, change_type: ChangeType) -> Self {
		Self {
			path: path.into(),
			change_type,
			additions: 0,
			deletions: 0,
			is_binary: false,
		}
	}

	pub fn with_stats(mut self, additions: u32, deletions: u32) -> Self {
		self.additions = additions;
		self.deletions = deletions;
		self
	}

	pub fn binary(mut self) -> Self {
		self.is_binary = true;
		self
	}
}

/// Comparison context of a session worktree against its base.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchInfo {
	pub current_branch: String,
	pub base_branch: String,
	pub base_commit: String,
	pub head_commit: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BranchContext {
	#[default]
	None,
	/// Session worktree compared against its base branch.
	Compared(BranchInfo),
	/// Orchestrator working tree; only the checked-out branch is known.
	#[serde(rename_all = "camelCase")]
	WorkingTree { current_branch: String },
}

impl BranchContext {
	pub fn current_branch(&self) -> Option<&str> {
		match self {
			Self::None => None,
			Self::Compared(info) => Some(&info.current_branch),
			Self::WorkingTree { current_branch } => Some(current_branch),
		}
	}

	pub fn branch_info(&self) -> Option<&BranchInfo> {
		match self {
			Self::Compared(info) => Some(info),
			_ => None,
		}
	}
}

impl From<Option<BranchInfo>> for BranchContext {
	fn from(info: Option<BranchInfo>) -> Self {
		info.map(Self::Compared).unwrap_or_default()
	}
}

/// A change set as produced by a backend call or carried by a push event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
	pub files: Vec<ChangedFile>,
	#[serde(default)]
	pub branch: BranchContext,
}

impl ChangeSet {
	pub fn session(files: Vec<ChangedFile>, branch_info: Option<BranchInfo>) -> Self {
		Self {
			files,
			branch: branch_info.into(),
		}
	}

	pub fn working_tree(files: Vec<ChangedFile>, current_branch: impl Into<String>) -> Self {
		Self {
			files,
			branch: BranchContext::WorkingTree {
				current_branch: current_branch.into(),
			},
		}
	}
}

/// A committed change set. Never patched; a refresh replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSetSnapshot {
	files: Vec<ChangedFile>,
	branch: BranchContext,
	fetched_at_epoch: Epoch,
}

impl ChangeSetSnapshot {
	pub fn new(change_set: ChangeSet, fetched_at_epoch: Epoch) -> Self {
		Self {
			files: change_set.files,
			branch: change_set.branch,
			fetched_at_epoch,
		}
	}

	pub fn files(&self) -> &[ChangedFile] {
		&self.files
	}

	pub fn branch(&self) -> &BranchContext {
		&self.branch
	}

	pub fn fetched_at_epoch(&self) -> Epoch {
		self.fetched_at_epoch
	}

	pub fn file_count(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}

	pub fn total_additions(&self) -> u64 {
		self.files.iter().map(|f| u64::from(f.additions)).sum()
	}

	pub fn total_deletions(&self) -> u64 {
		self.files.iter().map(|f| u64::from(f.deletions)).sum()
	}

	/// True when both snapshots describe the same files and branch, regardless
	/// of which epoch produced them.
	pub fn same_content(&self, other: &ChangeSetSnapshot) -> bool {
		self.files == other.files && self.branch == other.branch
	}
}
