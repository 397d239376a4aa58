// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Change-set loading for the Maestro diff panel.
//!
//! The user flips between the orchestrator view and many agent sessions, often
//! faster than a backend call returns. [`ChangeSetLoader`] keeps the visible
//! [`DiffView`] honest under that churn:
//!
//! - **Epochs**: every load attempt bumps a per-identity counter and a result
//!   is committed only if its epoch is still current when it resolves
//! - **Single-flight**: at most one load per identity is in progress
//! - **Instant restore**: cached snapshots are shown synchronously on switch
//! - **Push invalidation**: [`EventBridge`] feeds file-change, git-stats and
//!   project-switch events into the same loader entry points
//!
//! The backend and file watcher are injected through [`FetchBackend`] and
//! [`WatcherControl`], and all shared bookkeeping lives in an explicit
//! [`DiffCacheService`].
//!
//! # Example
//!
//! ```ignore
//! use maestro_diff_loader::{ChangeSetLoader, DiffFileList, IdentityKey};
//!
//! let loader = ChangeSetLoader::builder(backend).watcher(watcher).build();
//! let mut list = DiffFileList::new(&loader);
//!
//! loader.select_identity(IdentityKey::session("/work/alpha", "fix-login"));
//! while list.changed().await {
//!     println!("{:?} {}", list.status(), list.selection_count());
//! }
//! ```

mod backend;
mod cache;
mod config;
mod epoch;
mod error;
mod events;
mod file_list;
mod loader;
mod service;
mod view;
mod watcher;

pub use backend::{fetch_change_set, FetchBackend};
pub use cache::{ChangeSetCache, DEFAULT_CACHE_CAPACITY};
pub use config::LoaderConfig;
pub use epoch::EpochLedger;
pub use error::{ConfigError, FetchError, WatcherError};
pub use events::{process_event, ChangeSetEvent, EventBridge};
pub use file_list::DiffFileList;
pub use loader::{ChangeSetLoader, ChangeSetLoaderBuilder};
pub use service::{DiffCacheService, LoadPhase};
pub use view::{DiffView, ViewStatus};
pub use watcher::{NoopWatcher, WatcherControl};

pub use maestro_diff_core::{
	BranchContext, BranchInfo, ChangeSet, ChangeSetSnapshot, ChangeType, ChangedFile, CheckState,
	Epoch, IdentityKey, PathSelection, SelectionCount, SelectionNode, SelectionTree,
};
