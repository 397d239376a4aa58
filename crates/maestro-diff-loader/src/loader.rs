// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::Path;
use std::sync::Arc;

use maestro_diff_core::{ChangeSet, ChangeSetSnapshot, Epoch, IdentityKey};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::backend::{fetch_change_set, FetchBackend};
use crate::config::LoaderConfig;
use crate::error::FetchError;
use crate::service::{DiffCacheService, LoadPhase, ServiceState};
use crate::view::DiffView;
use crate::watcher::{NoopWatcher, WatcherControl};

/// Loads, caches and publishes change sets for a rapidly switching identity.
///
/// Every public method performs its bookkeeping synchronously and returns
/// before any backend call completes. Fetches run on spawned tasks, at most
/// one per identity. A result is committed only if the identity's epoch is
/// unchanged when it resolves, and published only if the identity is still
/// on screen.
#[derive(Clone)]
pub struct ChangeSetLoader {
	inner: Arc<LoaderInner>,
}

struct LoaderInner {
	backend: Arc<dyn FetchBackend>,
	watcher: Arc<dyn WatcherControl>,
	service: DiffCacheService,
	config: LoaderConfig,
	view: watch::Sender<DiffView>,
}

enum FollowUp {
	None,
	StartWatching,
	StopWatching,
}

pub struct ChangeSetLoaderBuilder {
	backend: Arc<dyn FetchBackend>,
	watcher: Option<Arc<dyn WatcherControl>>,
	service: Option<DiffCacheService>,
	config: LoaderConfig,
}

impl ChangeSetLoaderBuilder {
	pub fn watcher(mut self, watcher: Arc<dyn WatcherControl>) -> Self {
		self.watcher = Some(watcher);
		self
	}

	/// Share bookkeeping with other loaders. Without this the loader gets a
	/// private service sized by the config's cache capacity.
	pub fn service(mut self, service: DiffCacheService) -> Self {
		self.service = Some(service);
		self
	}

	pub fn config(mut self, config: LoaderConfig) -> Self {
		self.config = config;
		self
	}

	pub fn build(self) -> ChangeSetLoader {
		let service = self
			.service
			.unwrap_or_else(|| DiffCacheService::new(self.config.cache_capacity));
		let (view, _) = watch::channel(DiffView::idle());

		ChangeSetLoader {
			inner: Arc::new(LoaderInner {
				backend: self.backend,
				watcher: self.watcher.unwrap_or_else(|| Arc::new(NoopWatcher)),
				service,
				config: self.config,
				view,
			}),
		}
	}
}

impl ChangeSetLoader {
	pub fn builder(backend: Arc<dyn FetchBackend>) -> ChangeSetLoaderBuilder {
		ChangeSetLoaderBuilder {
			backend,
			watcher: None,
			service: None,
			config: LoaderConfig::default(),
		}
	}

	pub fn new(backend: Arc<dyn FetchBackend>) -> Self {
		Self::builder(backend).build()
	}

	pub fn subscribe(&self) -> watch::Receiver<DiffView> {
		self.inner.view.subscribe()
	}

	pub fn view(&self) -> DiffView {
		self.inner.view.borrow().clone()
	}

	pub fn service(&self) -> &DiffCacheService {
		&self.inner.service
	}

	pub fn config(&self) -> &LoaderConfig {
		&self.inner.config
	}

	pub fn active_identity(&self) -> Option<IdentityKey> {
		self.inner.service.active_identity()
	}

	pub fn phase(&self, key: &IdentityKey) -> LoadPhase {
		self.inner.service.phase(key)
	}

	/// Switch the panel to `key`.
	///
	/// A load still in flight for the previous identity keeps running and fills
	/// that identity's cache, but never reaches the view. Cached data for `key`
	/// is on screen, or the screen is cleared, by the time this returns.
	pub fn select_identity(&self, key: IdentityKey) -> Option<JoinHandle<()>> {
		let previous = self.inner.service.lock().set_active(Some(key.clone()));
		if let Some(previous) = previous.filter(|previous| *previous != key) {
			trace!(from = %previous, to = %key, "switching diff identity");
		}
		self.load_for_key(key)
	}

	/// Deselect everything.
	pub fn clear_selection(&self) {
		let mut state = self.inner.service.lock();
		if let Some(previous) = state.set_active(None) {
			debug!(identity = %previous, "cleared diff selection");
		}
		self.publish(DiffView::idle());
	}

	/// Ensure `key` has fresh data, restoring its cached snapshot right away.
	///
	/// Returns the spawned fetch task, or `None` when no fetch was issued
	/// because one is already in flight, the identity is known to be gone, or
	/// the cached copy is served without revalidation.
	pub fn load_for_key(&self, key: IdentityKey) -> Option<JoinHandle<()>> {
		let epoch = {
			let mut state = self.inner.service.lock();
			let is_active = state.is_active(&key);

			if state.is_missing(&key) {
				trace!(identity = %key, "skipping load of missing identity");
				if is_active {
					self.publish(DiffView::missing(key));
				}
				return None;
			}

			let cached = state.cache.get(&key);
			let epoch = if cached.is_some() && !self.inner.config.revalidate_on_restore {
				None
			} else {
				state.begin_load(&key)
			};

			if is_active {
				self.publish(restore_view(&state, &key, cached));
			}

			match epoch {
				Some(epoch) => epoch,
				None => {
					trace!(identity = %key, "no fetch issued");
					return None;
				}
			}
		};

		debug!(identity = %key, epoch = epoch.get(), "loading change set");
		let loader = self.clone();
		Some(tokio::spawn(async move {
			let result = fetch_change_set(loader.inner.backend.as_ref(), &key).await;
			loader.complete(key, epoch, result).await;
		}))
	}

	/// Drop cached data for `key` and reload it if it is on screen.
	///
	/// While a load is in flight no second fetch is issued. Instead one reload
	/// is queued for when the pending load settles, however many invalidations
	/// arrive in the meantime.
	pub fn invalidate(&self, key: IdentityKey) -> Option<JoinHandle<()>> {
		let reload = {
			let mut state = self.inner.service.lock();
			state.cache.invalidate(&key);
			if state.clear_missing(&key) {
				debug!(identity = %key, "cleared missing mark");
			}
			if state.mark_dirty(&key) {
				debug!(identity = %key, "refresh queued behind in-flight load");
				return None;
			}
			state.is_active(&key)
		};

		if reload {
			self.load_for_key(key)
		} else {
			None
		}
	}

	/// Commit a change set delivered by a push event as if a load had just
	/// resolved for `key`. A load still in flight for `key` keeps its slot but
	/// its result will be discarded.
	pub fn apply_pushed(&self, key: IdentityKey, change_set: ChangeSet) {
		let mut state = self.inner.service.lock();
		let epoch = state.settle_pushed(&key);
		let snapshot = Arc::new(ChangeSetSnapshot::new(change_set, epoch));
		debug!(
			identity = %key,
			epoch = epoch.get(),
			files = snapshot.file_count(),
			"applied pushed change set"
		);
		state.cache.set(key.clone(), Arc::clone(&snapshot));
		if state.is_active(&key) {
			self.publish(DiffView::ready(key, snapshot));
		}
	}

	/// A project switch finished. Everything cached for `project_path` is
	/// dropped and the active identity is refreshed if it lives there.
	pub fn handle_project_switched(&self, project_path: &Path) -> Option<JoinHandle<()>> {
		let dropped = self.inner.service.lock().invalidate_project(project_path);
		debug!(project = %project_path.display(), dropped, "dropped cached change sets for project");
		let active = self.inner.service.active_identity()?;
		if active.belongs_to(project_path) {
			self.invalidate(active)
		} else {
			None
		}
	}

	async fn complete(&self, key: IdentityKey, epoch: Epoch, result: Result<ChangeSet, FetchError>) {
		let (follow_up, reload) = {
			let mut state = self.inner.service.lock();
			let current = state.finish(&key, epoch);
			let dirty = state.take_dirty(&key);
			let is_active = state.is_active(&key);
			let watch = self.inner.config.watch_sessions && !key.is_orchestrator();

			if !current {
				trace!(identity = %key, epoch = epoch.get(), "discarding stale load result");
				// A re-render may have shown the pushed snapshot as refreshing.
				if let Some(snapshot) = state.cache.get(&key).filter(|_| is_active) {
					self.publish(DiffView::ready(key.clone(), snapshot));
				}
				(FollowUp::None, dirty && is_active)
			} else {
				match result {
					Err(err) if err.is_identity_missing() => {
						debug!(identity = %key, error = %err, "identity no longer exists");
						state.mark_missing(&key);
						if is_active {
							self.publish(DiffView::missing(key.clone()));
						}
						let follow_up = if watch {
							FollowUp::StopWatching
						} else {
							FollowUp::None
						};
						(follow_up, false)
					}
					// Invalidated while in flight and off screen; keep the cache empty.
					Ok(_) if dirty && !is_active => {
						trace!(identity = %key, epoch = epoch.get(), "dropping result of invalidated background load");
						(FollowUp::None, false)
					}
					Ok(change_set) => {
						let snapshot = Arc::new(ChangeSetSnapshot::new(change_set, epoch));
						debug!(
							identity = %key,
							epoch = epoch.get(),
							files = snapshot.file_count(),
							"change set loaded"
						);
						state.cache.set(key.clone(), Arc::clone(&snapshot));
						if is_active {
							self.publish(DiffView::ready(key.clone(), snapshot));
						}
						let follow_up = if watch {
							FollowUp::StartWatching
						} else {
							FollowUp::None
						};
						(follow_up, dirty && is_active)
					}
					Err(err) if is_active => {
						error!(identity = %key, epoch = epoch.get(), error = %err, "failed to load change set");
						self.publish(DiffView::failed(key.clone(), err.to_string()));
						(FollowUp::None, dirty)
					}
					Err(err) => {
						warn!(identity = %key, epoch = epoch.get(), error = %err, "background change set load failed");
						(FollowUp::None, false)
					}
				}
			}
		};

		if reload {
			debug!(identity = %key, "reloading after invalidation during load");
			self.load_for_key(key.clone());
		}

		match follow_up {
			FollowUp::None => {}
			FollowUp::StartWatching => {
				if let Err(e) = self.inner.watcher.start_watching(&key).await {
					warn!(identity = %key, error = %e, "failed to start watching");
				}
			}
			FollowUp::StopWatching => {
				if let Err(e) = self.inner.watcher.stop_watching(&key).await {
					warn!(identity = %key, error = %e, "failed to stop watching");
				}
			}
		}
	}

	fn publish(&self, view: DiffView) {
		self.inner.view.send_if_modified(|current| {
			if *current == view {
				false
			} else {
				*current = view;
				true
			}
		});
	}
}

/// View for an identity that just became visible or is being reloaded.
fn restore_view(
	state: &ServiceState,
	key: &IdentityKey,
	cached: Option<Arc<ChangeSetSnapshot>>,
) -> DiffView {
	match cached {
		Some(snapshot) if state.is_loading(key) => DiffView::refreshing(key.clone(), snapshot),
		Some(snapshot) => DiffView::ready(key.clone(), snapshot),
		None => DiffView::loading(key.clone()),
	}
}
