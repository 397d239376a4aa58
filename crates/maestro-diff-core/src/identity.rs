// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identifies whose changes a diff view is showing.
///
/// Keys are plain values: two keys are equal only when every field matches, so
/// the orchestrator of one project never aliases the orchestrator of another.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IdentityKey {
	/// The project's own working directory.
	#[serde(rename_all = "camelCase")]
	Orchestrator { project_path: PathBuf },
	/// An agent session's worktree inside a project.
	#[serde(rename_all = "camelCase")]
	Session {
		project_path: PathBuf,
		session_name: String,
	},
}

impl IdentityKey {
	pub fn orchestrator(project_path: impl Into<PathBuf>) -> Self {
		Self::Orchestrator {
			project_path: project_path.into(),
		}
	}

	pub fn session(project_path: impl Into<PathBuf>, session_name: impl Into<String>) -> Self {
		Self::Session {
			project_path: project_path.into(),
			session_name: session_name.into(),
		}
	}

	pub fn project_path(&self) -> &Path {
		match self {
			Self::Orchestrator { project_path } | Self::Session { project_path, .. } => project_path,
		}
	}

	pub fn session_name(&self) -> Option<&str> {
		match self {
			Self::Orchestrator { .. } => None,
			Self::Session { session_name, .. } => Some(session_name),
		}
	}

	pub fn is_orchestrator(&self) -> bool {
		matches!(self, Self::Orchestrator { .. })
	}

	pub fn belongs_to(&self, project_path: &Path) -> bool {
		self.project_path() == project_path
	}
}

impl fmt::Display for IdentityKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Orchestrator { project_path } => {
				write!(f, "orchestrator@{}", project_path.display())
			}
			Self::Session {
				project_path,
				session_name,
			} => write!(f, "session:{session_name}@{}", project_path.display()),
		}
	}
}
