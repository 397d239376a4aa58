// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::ConfigError;

/// Loader tuning, read from an optional JSON file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderConfig {
	/// Re-fetch when restoring a cached snapshot. When off, a cache hit is shown
	/// as-is and no request is issued.
	pub revalidate_on_restore: bool,
	/// Ask the watcher to follow a session after its first successful load.
	pub watch_sessions: bool,
	/// Maximum cached identities. Zero means unbounded.
	pub cache_capacity: usize,
}

impl Default for LoaderConfig {
	fn default() -> Self {
		Self {
			revalidate_on_restore: true,
			watch_sessions: true,
			cache_capacity: DEFAULT_CACHE_CAPACITY,
		}
	}
}

impl LoaderConfig {
	pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Load from `path`, falling back to defaults when the file does not exist.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		if !path.exists() {
			debug!(path = %path.display(), "no loader config file, using defaults");
			return Ok(Self::default());
		}

		let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		let config = Self::from_json_str(&content)?;
		debug!(
			path = %path.display(),
			revalidate_on_restore = config.revalidate_on_restore,
			watch_sessions = config.watch_sessions,
			cache_capacity = config.cache_capacity,
			"loaded loader config"
		);
		Ok(config)
	}
}
