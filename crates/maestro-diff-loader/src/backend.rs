// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::Path;

use async_trait::async_trait;
use maestro_diff_core::{ChangeSet, ChangedFile, IdentityKey};

use crate::error::FetchError;

/// Source of change sets. The transport (IPC, git CLI, HTTP) is up to the
/// implementor.
#[async_trait]
pub trait FetchBackend: Send + Sync {
	/// Changed files of a session worktree against its base, with branch info.
	async fn fetch_session_changes(
		&self,
		project_path: &Path,
		session_name: &str,
	) -> Result<ChangeSet, FetchError>;

	/// Uncommitted changes in the project's own working directory.
	async fn fetch_orchestrator_changes(
		&self,
		project_path: &Path,
	) -> Result<Vec<ChangedFile>, FetchError>;

	async fn fetch_current_branch(&self, project_path: &Path) -> Result<String, FetchError>;
}

/// Fetch the change set for `key`. Orchestrator loads issue their two calls
/// concurrently and fail if either fails.
pub async fn fetch_change_set(
	backend: &dyn FetchBackend,
	key: &IdentityKey,
) -> Result<ChangeSet, FetchError> {
	match key {
		IdentityKey::Session {
			project_path,
			session_name,
		} => backend.fetch_session_changes(project_path, session_name).await,
		IdentityKey::Orchestrator { project_path } => {
			let (files, branch) = futures::future::try_join(
				backend.fetch_orchestrator_changes(project_path),
				backend.fetch_current_branch(project_path),
			)
			.await?;
			Ok(ChangeSet::working_tree(files, branch))
		}
	}
}
