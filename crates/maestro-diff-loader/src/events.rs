// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Push invalidation.
//!
//! The host forwards backend notifications as [`ChangeSetEvent`]s. They enter
//! the loader through the same entry points as user-driven loads, so the epoch
//! rules cover both paths.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use maestro_diff_core::{ChangeSet, IdentityKey};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::loader::ChangeSetLoader;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChangeSetEvent {
	/// The watcher saw files change and sent the new change set along.
	#[serde(rename_all = "camelCase")]
	FilesChanged {
		identity: IdentityKey,
		change_set: ChangeSet,
	},
	/// Ahead/behind or diff stats moved; the change set must be re-fetched.
	GitStatsUpdated { identity: IdentityKey },
	#[serde(rename_all = "camelCase")]
	ProjectSwitchCompleted { project_path: PathBuf },
}

impl ChangeSetEvent {
	pub fn event_type(&self) -> &'static str {
		match self {
			Self::FilesChanged { .. } => "files_changed",
			Self::GitStatsUpdated { .. } => "git_stats_updated",
			Self::ProjectSwitchCompleted { .. } => "project_switch_completed",
		}
	}
}

/// Route one event into the loader. Returns the fetch task if one was started.
pub fn process_event(loader: &ChangeSetLoader, event: ChangeSetEvent) -> Option<JoinHandle<()>> {
	debug!(event_type = %event.event_type(), "processing change set event");

	match event {
		ChangeSetEvent::FilesChanged {
			identity,
			change_set,
		} => {
			loader.apply_pushed(identity, change_set);
			None
		}
		ChangeSetEvent::GitStatsUpdated { identity } => loader.invalidate(identity),
		ChangeSetEvent::ProjectSwitchCompleted { project_path } => {
			loader.handle_project_switched(&project_path)
		}
	}
}

/// Background pump feeding events from a channel into a loader.
#[derive(Debug)]
pub struct EventBridge {
	running: Arc<AtomicBool>,
	events_received: Arc<AtomicU64>,
	task_handle: Option<JoinHandle<()>>,
	shutdown_tx: Option<mpsc::Sender<()>>,
}

impl EventBridge {
	pub fn new() -> Self {
		Self {
			running: Arc::new(AtomicBool::new(false)),
			events_received: Arc::new(AtomicU64::new(0)),
			task_handle: None,
			shutdown_tx: None,
		}
	}

	/// Start pumping `events` into `loader`, stopping any previous pump first.
	pub async fn start(
		&mut self,
		loader: ChangeSetLoader,
		events: mpsc::UnboundedReceiver<ChangeSetEvent>,
	) {
		self.stop().await;

		let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
		self.shutdown_tx = Some(shutdown_tx);
		self.running.store(true, Ordering::SeqCst);

		let running = Arc::clone(&self.running);
		let events_received = Arc::clone(&self.events_received);

		let handle = tokio::spawn(async move {
			run_event_loop(loader, events, shutdown_rx, events_received).await;
			running.store(false, Ordering::SeqCst);
		});
		self.task_handle = Some(handle);
	}

	pub async fn stop(&mut self) {
		if let Some(tx) = self.shutdown_tx.take() {
			let _ = tx.send(()).await;
		}
		if let Some(handle) = self.task_handle.take() {
			let _ = handle.await;
		}
		self.running.store(false, Ordering::SeqCst);
	}

	/// False once stopped or after the event channel closed.
	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}

	pub fn events_received(&self) -> u64 {
		self.events_received.load(Ordering::SeqCst)
	}
}

impl Default for EventBridge {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for EventBridge {
	fn drop(&mut self) {
		if let Some(handle) = self.task_handle.take() {
			handle.abort();
		}
	}
}

async fn run_event_loop(
	loader: ChangeSetLoader,
	mut events: mpsc::UnboundedReceiver<ChangeSetEvent>,
	mut shutdown_rx: mpsc::Receiver<()>,
	events_received: Arc<AtomicU64>,
) {
	info!("change set event bridge started");

	loop {
		tokio::select! {
			biased;
			_ = shutdown_rx.recv() => {
				info!("change set event bridge received shutdown signal");
				break;
			}
			event = events.recv() => match event {
				Some(event) => {
					events_received.fetch_add(1, Ordering::SeqCst);
					process_event(&loader, event);
				}
				None => {
					debug!("change set event channel closed");
					break;
				}
			}
		}
	}
}
