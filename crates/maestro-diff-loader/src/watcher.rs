// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use maestro_diff_core::IdentityKey;

use crate::error::WatcherError;

/// File watcher lifecycle hooks driven by load outcomes.
#[async_trait]
pub trait WatcherControl: Send + Sync {
	async fn start_watching(&self, key: &IdentityKey) -> Result<(), WatcherError>;

	async fn stop_watching(&self, key: &IdentityKey) -> Result<(), WatcherError>;
}

/// Watcher for hosts that deliver file events some other way.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopWatcher;

#[async_trait]
impl WatcherControl for NoopWatcher {
	async fn start_watching(&self, _key: &IdentityKey) -> Result<(), WatcherError> {
		Ok(())
	}

	async fn stop_watching(&self, _key: &IdentityKey) -> Result<(), WatcherError> {
		Ok(())
	}
}
