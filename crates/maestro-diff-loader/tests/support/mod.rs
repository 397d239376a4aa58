// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared fixtures: a backend whose calls are answered by hand, a watcher that
//! records calls, and a tracing layer that counts log events.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use maestro_diff_loader::{
	ChangeSet, ChangeSetLoader, ChangeType, ChangedFile, FetchBackend, FetchError, IdentityKey,
	LoaderConfig, WatcherControl, WatcherError,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

pub enum Reply {
	Session(Result<ChangeSet, FetchError>),
	Files(Result<Vec<ChangedFile>, FetchError>),
	Branch(Result<String, FetchError>),
}

type AutoReply = Box<dyn Fn() -> Reply + Send + Sync>;

/// Backend whose calls block until a test resolves them, unless an automatic
/// reply is registered for the call's label.
///
/// Labels: `session:<key>`, `files:<key>` and `branch:<key>`, where `<key>` is
/// the identity's `Display` form.
#[derive(Default)]
pub struct ScriptedBackend {
	calls: Mutex<Vec<String>>,
	auto: Mutex<HashMap<String, AutoReply>>,
	pending: Mutex<Vec<(String, oneshot::Sender<Reply>)>>,
}

pub fn session_label(key: &IdentityKey) -> String {
	format!("session:{key}")
}

pub fn files_label(key: &IdentityKey) -> String {
	format!("files:{key}")
}

pub fn branch_label(key: &IdentityKey) -> String {
	format!("branch:{key}")
}

impl ScriptedBackend {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn auto_session(
		&self,
		key: &IdentityKey,
		reply: impl Fn() -> Result<ChangeSet, FetchError> + Send + Sync + 'static,
	) {
		self.auto
			.lock()
			.insert(session_label(key), Box::new(move || Reply::Session(reply())));
	}

	pub fn auto_orchestrator(&self, key: &IdentityKey, files: Vec<ChangedFile>, branch: &str) {
		let branch = branch.to_string();
		let mut auto = self.auto.lock();
		auto.insert(
			files_label(key),
			Box::new(move || Reply::Files(Ok(files.clone()))),
		);
		auto.insert(
			branch_label(key),
			Box::new(move || Reply::Branch(Ok(branch.clone()))),
		);
	}

	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().clone()
	}

	pub fn call_count(&self, label: &str) -> usize {
		self.calls.lock().iter().filter(|c| *c == label).count()
	}

	pub fn session_calls(&self, key: &IdentityKey) -> usize {
		self.call_count(&session_label(key))
	}

	pub fn pending_count(&self, label: &str) -> usize {
		self.pending.lock().iter().filter(|(l, _)| l == label).count()
	}

	/// Answer the oldest pending session call for `key`.
	pub async fn resolve_session(&self, key: &IdentityKey, result: Result<ChangeSet, FetchError>) {
		self.resolve(&session_label(key), false, Reply::Session(result))
			.await;
	}

	/// Answer the most recent pending session call for `key`.
	pub async fn resolve_newest_session(
		&self,
		key: &IdentityKey,
		result: Result<ChangeSet, FetchError>,
	) {
		self.resolve(&session_label(key), true, Reply::Session(result))
			.await;
	}

	pub async fn resolve_files(&self, key: &IdentityKey, result: Result<Vec<ChangedFile>, FetchError>) {
		self.resolve(&files_label(key), false, Reply::Files(result))
			.await;
	}

	pub async fn resolve_branch(&self, key: &IdentityKey, result: Result<String, FetchError>) {
		self.resolve(&branch_label(key), false, Reply::Branch(result))
			.await;
	}

	/// Wait until `count` calls with `label` are pending.
	pub async fn wait_pending(&self, label: &str, count: usize) {
		for _ in 0..100 {
			if self.pending_count(label) >= count {
				return;
			}
			tokio::task::yield_now().await;
		}
		panic!("expected {count} pending calls for {label}, found {}", self.pending_count(label));
	}

	async fn resolve(&self, label: &str, newest: bool, reply: Reply) {
		self.wait_pending(label, 1).await;
		let sender = {
			let mut pending = self.pending.lock();
			let position = if newest {
				pending.iter().rposition(|(l, _)| l == label)
			} else {
				pending.iter().position(|(l, _)| l == label)
			};
			let index = position.unwrap_or_else(|| panic!("no pending call for {label}"));
			pending.remove(index).1
		};
		let _ = sender.send(reply);
		pump().await;
	}

	async fn call(&self, label: String) -> Reply {
		self.calls.lock().push(label.clone());
		let auto = self.auto.lock().get(&label).map(|reply| reply());
		if let Some(reply) = auto {
			return reply;
		}

		let (tx, rx) = oneshot::channel();
		self.pending.lock().push((label.clone(), tx));
		rx.await
			.unwrap_or_else(|_| panic!("scripted call {label} was never answered"))
	}
}

#[async_trait]
impl FetchBackend for ScriptedBackend {
	async fn fetch_session_changes(
		&self,
		project_path: &Path,
		session_name: &str,
	) -> Result<ChangeSet, FetchError> {
		let key = IdentityKey::session(project_path, session_name);
		match self.call(session_label(&key)).await {
			Reply::Session(result) => result,
			_ => panic!("wrong reply kind for session call"),
		}
	}

	async fn fetch_orchestrator_changes(
		&self,
		project_path: &Path,
	) -> Result<Vec<ChangedFile>, FetchError> {
		let key = IdentityKey::orchestrator(project_path);
		match self.call(files_label(&key)).await {
			Reply::Files(result) => result,
			_ => panic!("wrong reply kind for files call"),
		}
	}

	async fn fetch_current_branch(&self, project_path: &Path) -> Result<String, FetchError> {
		let key = IdentityKey::orchestrator(project_path);
		match self.call(branch_label(&key)).await {
			Reply::Branch(result) => result,
			_ => panic!("wrong reply kind for branch call"),
		}
	}
}

#[derive(Default)]
pub struct RecordingWatcher {
	started: Mutex<Vec<IdentityKey>>,
	stopped: Mutex<Vec<IdentityKey>>,
}

impl RecordingWatcher {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn started(&self) -> Vec<IdentityKey> {
		self.started.lock().clone()
	}

	pub fn stopped(&self) -> Vec<IdentityKey> {
		self.stopped.lock().clone()
	}
}

#[async_trait]
impl WatcherControl for RecordingWatcher {
	async fn start_watching(&self, key: &IdentityKey) -> Result<(), WatcherError> {
		self.started.lock().push(key.clone());
		Ok(())
	}

	async fn stop_watching(&self, key: &IdentityKey) -> Result<(), WatcherError> {
		self.stopped.lock().push(key.clone());
		Ok(())
	}
}

/// Tracing layer that keeps every event's level and message.
#[derive(Clone, Default)]
pub struct LogCapture {
	events: Arc<Mutex<Vec<(Level, String)>>>,
}

impl LogCapture {
	pub fn count(&self, level: Level) -> usize {
		self.events.lock().iter().filter(|(l, _)| *l == level).count()
	}

	pub fn messages(&self, level: Level) -> Vec<String> {
		self.events
			.lock()
			.iter()
			.filter(|(l, _)| *l == level)
			.map(|(_, m)| m.clone())
			.collect()
	}
}

impl<S> Layer<S> for LogCapture
where
	S: Subscriber + for<'a> LookupSpan<'a>,
{
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let mut visitor = MessageVisitor::default();
		event.record(&mut visitor);
		self.events
			.lock()
			.push((*event.metadata().level(), visitor.message));
	}
}

#[derive(Default)]
struct MessageVisitor {
	message: String,
}

impl Visit for MessageVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		if field.name() == "message" {
			self.message = format!("{value:?}");
		}
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == "message" {
			self.message = value.to_string();
		}
	}
}

/// Install a capturing subscriber for the current thread. Keep the guard alive
/// for the whole test; `#[tokio::test]` runs spawned tasks on the same thread.
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
	let capture = LogCapture::default();
	let subscriber = tracing_subscriber::registry().with(capture.clone());
	let guard = tracing::subscriber::set_default(subscriber);
	(capture, guard)
}

/// Let spawned tasks run until they block again.
pub async fn pump() {
	for _ in 0..8 {
		tokio::task::yield_now().await;
	}
}

pub fn files(paths: &[&str]) -> Vec<ChangedFile> {
	paths
		.iter()
		.map(|p| ChangedFile::new(*p, ChangeType::Modified).with_stats(1, 0))
		.collect()
}

pub fn change_set(paths: &[&str]) -> ChangeSet {
	ChangeSet::session(files(paths), None)
}

pub fn loader(backend: &Arc<ScriptedBackend>, watcher: &Arc<RecordingWatcher>) -> ChangeSetLoader {
	loader_with_config(backend, watcher, LoaderConfig::default())
}

pub fn loader_with_config(
	backend: &Arc<ScriptedBackend>,
	watcher: &Arc<RecordingWatcher>,
	config: LoaderConfig,
) -> ChangeSetLoader {
	ChangeSetLoader::builder(backend.clone())
		.watcher(watcher.clone())
		.config(config)
		.build()
}
