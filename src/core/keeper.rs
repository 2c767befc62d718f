use crate::core::app_log::{AppLog, AppLogRecord};
use crate::core::debounce::{Debouncer, DEBOUNCE_DELAY};
use crate::core::host::{EventHandler, ManagedWindow, Screen, Subscription, WindowEvent};
use crate::core::persistence::{FileStore, RecordStore};
use crate::core::reconcile::default_state;
use crate::core::state_store::{write_snapshot, Observation, StateStore};
use crate::models::{Config, DisplayBounds, PersistedState};
use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};
use serde_json::json;
use std::io;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;

struct Attachment {
    id: u64,
    window: Arc<dyn ManagedWindow>,
    runtime: Handle,
    _subscriptions: Vec<Subscription>,
}

/// Everything that changes after creation. Host windowing calls never run while it is locked:
/// a host getter may wait on the UI thread, which may in turn be delivering an event to us.
struct Session {
    state: StateStore,
    debounce: Debouncer,
    attachment: Option<Attachment>,
    attach_seq: u64,
}

impl Session {
    fn is_current(&self, attach_id: u64) -> bool {
        self.attachment.as_ref().is_some_and(|a| a.id == attach_id)
    }

    fn window_for(&self, attach_id: u64) -> Option<Arc<dyn ManagedWindow>> {
        self.attachment
            .as_ref()
            .filter(|a| a.id == attach_id)
            .map(|a| Arc::clone(&a.window))
    }

    /// Unhooks the current window. The returned attachment still owns the subscriptions; the
    /// caller drops it once the lock is released so host unsubscribe calls never run under it.
    fn take_attachment(&mut self) -> Option<Attachment> {
        self.debounce.cancel();
        self.attachment.take()
    }
}

struct Shared {
    config: Config,
    screen: Arc<dyn Screen>,
    store: Arc<dyn RecordStore>,
    log: AppLog,
    session: Mutex<Session>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock()
    }

    fn observe(&self, window: &dyn ManagedWindow) -> Option<Observation> {
        match Observation::take(window, &*self.screen) {
            Ok(observation) => Some(observation),
            Err(e) => {
                self.log
                    .warn("observe", "window_query_failed", Some(json!({ "error": format!("{:#}", e) })));
                None
            }
        }
    }

    /// Samples the window attached as `attach_id`.
    ///
    /// With `yield_to_newer`, the sample is dropped when another debounce timer was armed while
    /// the host was being queried; that timer samples again.
    fn sample_attached(&self, attach_id: u64, yield_to_newer: bool) {
        let Some(window) = self.lock().window_for(attach_id) else {
            return;
        };
        let Some(observation) = self.observe(&*window) else {
            return;
        };
        let mut session = self.lock();
        if !session.is_current(attach_id) || (yield_to_newer && session.debounce.is_pending()) {
            return;
        }
        session.state.apply(&observation, &self.log);
    }

    /// Writes `snapshot` with the session unlocked, then records it as persisted.
    fn write(&self, snapshot: PersistedState) -> io::Result<()> {
        let key = &self.config.storage_key;
        match write_snapshot(&*self.store, key, &snapshot) {
            Ok(()) => {
                self.lock().state.mark_persisted(snapshot);
                self.log
                    .info("persist", "written", Some(json!({ "key": key, "state": snapshot })));
                Ok(())
            }
            Err(e) => {
                self.log.error(
                    "persist",
                    "write_failed",
                    Some(json!({ "key": key, "error": e.to_string() })),
                );
                Err(e)
            }
        }
    }

    fn persist(&self) -> io::Result<bool> {
        let Some(snapshot) = self.lock().state.pending_write() else {
            return Ok(false);
        };
        self.write(snapshot).map(|()| true)
    }
}

/// Keeps one window's geometry in sync with durable storage.
///
/// The saved record is loaded, validated and reconciled against the attached displays when the
/// keeper is created. [`Keeper::attach`] restores maximized/full-screen state and starts tracking
/// the window; its `destroyed` notification detaches and persists.
pub struct Keeper {
    shared: Arc<Shared>,
}

impl Keeper {
    /// Keeper backed by `<storage_dir>/<storage_key>` on disk.
    pub fn create(config: Config, screen: Arc<dyn Screen>) -> Self {
        let store = Arc::new(FileStore::new(config.storage_dir()));
        Self::with_store(config, screen, store)
    }

    pub fn with_store(config: Config, screen: Arc<dyn Screen>, store: Arc<dyn RecordStore>) -> Self {
        let log = AppLog::from_config(&config);
        let state = StateStore::load(&*store, &config, &*screen, &log);
        Self {
            shared: Arc::new(Shared {
                config,
                screen,
                store,
                log,
                session: Mutex::new(Session {
                    state,
                    debounce: Debouncer::new(),
                    attachment: None,
                    attach_seq: 0,
                }),
            }),
        }
    }

    pub fn current_state(&self) -> PersistedState {
        *self.shared.lock().state.current()
    }

    pub fn x(&self) -> Option<i32> {
        self.current_state().window_bounds.x
    }

    pub fn y(&self) -> Option<i32> {
        self.current_state().window_bounds.y
    }

    pub fn width(&self) -> i32 {
        self.current_state().window_bounds.width
    }

    pub fn height(&self) -> i32 {
        self.current_state().window_bounds.height
    }

    pub fn is_maximized(&self) -> bool {
        self.current_state().is_maximized
    }

    pub fn is_full_screen(&self) -> bool {
        self.current_state().is_full_screen
    }

    pub fn display_bounds(&self) -> DisplayBounds {
        self.current_state().display_bounds
    }

    pub fn is_attached(&self) -> bool {
        self.shared.lock().attachment.is_some()
    }

    /// Starts managing `window`, replacing any window managed before (which is not persisted).
    ///
    /// Resize/move samples are debounced on the tokio runtime the caller is in or, with the
    /// `tauri` feature, on Tauri's async runtime. Fails when neither is available; use
    /// [`Keeper::attach_with_runtime`] to name one explicitly.
    pub fn attach(&self, window: Arc<dyn ManagedWindow>) -> Result<()> {
        let runtime = ambient_runtime().context("Attaching a window requires a tokio runtime")?;
        self.attach_with_runtime(window, runtime)
    }

    pub fn attach_with_runtime(&self, window: Arc<dyn ManagedWindow>, runtime: Handle) -> Result<()> {
        self.detach();

        let (state, attach_id) = {
            let mut session = self.shared.lock();
            session.attach_seq = session.attach_seq.wrapping_add(1);
            (*session.state.current(), session.attach_seq)
        };

        // host calls may synchronously emit window events
        let config = &self.shared.config;
        if config.restore_maximize && state.is_maximized {
            if let Err(e) = window.maximize() {
                self.log_warn("attach", "maximize_failed", &e);
            }
        }
        if config.restore_full_screen && state.is_full_screen {
            if let Err(e) = window.set_full_screen(true) {
                self.log_warn("attach", "full_screen_failed", &e);
            }
        }

        let weak = Arc::downgrade(&self.shared);
        let mut subscriptions = Vec::with_capacity(WindowEvent::ALL.len());
        for event in WindowEvent::ALL {
            let subscription = window
                .subscribe(event, event_handler(&weak, attach_id, event))
                .with_context(|| format!("Failed to subscribe to {:?}", event))?;
            subscriptions.push(subscription);
        }

        let mut session = self.shared.lock();
        if session.attach_seq != attach_id {
            // a concurrent attach won; our subscriptions drop with this scope
            return Ok(());
        }
        session.attachment = Some(Attachment {
            id: attach_id,
            window,
            runtime,
            _subscriptions: subscriptions,
        });
        drop(session);
        self.shared.log.info("attach", "attached", Some(json!({ "state": state })));
        Ok(())
    }

    /// Stops tracking the window. Never persists; a no-op when nothing is attached.
    pub fn detach(&self) {
        let detached = self.shared.lock().take_attachment();
        if detached.is_some() {
            self.shared.log.info("detach", "detached", None);
        }
        drop(detached);
    }

    /// Writes the current state if it changed since the last write, sampling `window` first when
    /// given. Returns whether anything was written.
    pub fn persist(&self, window: Option<&dyn ManagedWindow>) -> io::Result<bool> {
        if let Some(observation) = window.and_then(|w| self.shared.observe(w)) {
            self.shared.lock().state.apply(&observation, &self.shared.log);
        }
        self.shared.persist()
    }

    /// Forgets the saved geometry in memory: default size, host placement, primary display.
    pub fn reset_to_default(&self) {
        let primary = self.shared.screen.primary_display().ok();
        let reset = default_state(&self.shared.config, primary.as_ref());
        self.shared.lock().state.replace(reset);
        self.shared.log.info("reset", "defaults_applied", Some(json!({ "state": reset })));
    }

    /// Newest `limit` log records, optionally filtered; empty unless `Config::log_dir` is set.
    pub fn logs(&self, limit: usize, query: Option<&str>) -> Result<Vec<AppLogRecord>, String> {
        self.shared.log.read(limit, query)
    }

    pub fn clear_logs(&self) -> Result<(), String> {
        self.shared.log.clear()
    }

    fn log_warn(&self, scope: &str, message: &str, error: &anyhow::Error) {
        self.shared
            .log
            .warn(scope, message, Some(json!({ "error": format!("{:#}", error) })));
    }
}

impl Drop for Keeper {
    fn drop(&mut self) {
        self.detach();
    }
}

fn ambient_runtime() -> Option<Handle> {
    Handle::try_current().ok().or_else(host_runtime)
}

#[cfg(feature = "tauri")]
fn host_runtime() -> Option<Handle> {
    // setup hooks and command handlers may run outside any entered runtime
    #[allow(unreachable_patterns)]
    match tauri::async_runtime::handle() {
        tauri::async_runtime::RuntimeHandle::Tokio(handle) => Some(handle),
        _ => None,
    }
}

#[cfg(not(feature = "tauri"))]
fn host_runtime() -> Option<Handle> {
    None
}

fn event_handler(weak: &Weak<Shared>, attach_id: u64, event: WindowEvent) -> EventHandler {
    let weak = weak.clone();
    Arc::new(move || {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        match event {
            WindowEvent::Resize | WindowEvent::Move => schedule_sample(&shared, attach_id),
            WindowEvent::Close => shared.sample_attached(attach_id, false),
            WindowEvent::Destroyed => on_destroyed(&shared, attach_id),
        }
    })
}

fn schedule_sample(shared: &Arc<Shared>, attach_id: u64) {
    let mut session = shared.lock();
    let Some(runtime) = session
        .attachment
        .as_ref()
        .filter(|a| a.id == attach_id)
        .map(|a| a.runtime.clone())
    else {
        return;
    };

    let weak = Arc::downgrade(shared);
    session.debounce.schedule(&runtime, DEBOUNCE_DELAY, move |generation| async move {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        {
            let mut session = shared.lock();
            if !session.is_current(attach_id) || !session.debounce.take_if_current(generation) {
                return;
            }
        }
        shared.sample_attached(attach_id, true);
    });
}

/// Detaches and hands the final write to the blocking pool so the host's event thread returns
/// without waiting on storage.
fn on_destroyed(shared: &Arc<Shared>, attach_id: u64) {
    let (detached, snapshot) = {
        let mut session = shared.lock();
        if !session.is_current(attach_id) {
            return;
        }
        (session.take_attachment(), session.state.pending_write())
    };
    shared.log.info("detach", "window_destroyed", None);

    let Some(detached) = detached else {
        return;
    };
    let runtime = detached.runtime.clone();
    drop(detached);

    if let Some(snapshot) = snapshot {
        let shared = Arc::clone(shared);
        runtime.spawn_blocking(move || {
            // already logged, and nobody is waiting on this path
            let _ = shared.write(snapshot);
        });
    }
}
