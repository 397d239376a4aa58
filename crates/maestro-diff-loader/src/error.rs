// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a backend change-set fetch.
#[derive(Debug, Error)]
pub enum FetchError {
	#[error("session not found: {session_name} in {}", .project_path.display())]
	SessionNotFound {
		project_path: PathBuf,
		session_name: String,
	},

	#[error("path not found: {}", .0.display())]
	PathNotFound(PathBuf),

	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	#[error("backend error: {0}")]
	Backend(String),
}

impl FetchError {
	pub fn backend(message: impl Into<String>) -> Self {
		Self::Backend(message.into())
	}

	/// The identity the fetch was for no longer exists. Callers stop watching
	/// and clear state instead of reporting an error.
	pub fn is_identity_missing(&self) -> bool {
		match self {
			Self::SessionNotFound { .. } | Self::PathNotFound(_) => true,
			Self::Io(err) => err.kind() == io::ErrorKind::NotFound,
			Self::Backend(_) => false,
		}
	}
}

#[derive(Debug, Error)]
pub enum WatcherError {
	#[error("watcher failed for {identity}: {message}")]
	Failed { identity: String, message: String },

	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config {}: {source}", .path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("invalid config: {0}")]
	Parse(#[from] serde_json::Error),
}
