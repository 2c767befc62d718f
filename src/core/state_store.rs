use crate::core::app_log::AppLog;
use crate::core::host::{ManagedWindow, Screen};
use crate::core::persistence::RecordStore;
use crate::core::reconcile::reconcile;
use crate::core::validator::decode_record;
use crate::models::{Config, Display, DisplayBounds, PersistedState, WindowBounds};
use anyhow::{Context, Result};
use serde_json::json;
use std::io;

/// True when `current` differs from the last written snapshot, or nothing was written yet.
pub fn has_changed(current: &PersistedState, last_persisted: Option<&PersistedState>) -> bool {
    match last_persisted {
        None => true,
        Some(last) => {
            current.display_bounds != last.display_bounds
                || current.window_bounds != last.window_bounds
                || current.is_maximized != last.is_maximized
                || current.is_full_screen != last.is_full_screen
        }
    }
}

/// One reading of the live window and the displays around it.
///
/// Taking it only talks to the host; nothing in the store is touched, so callers can sample
/// without holding whatever guards the store.
#[derive(Debug, Clone)]
pub struct Observation {
    bounds: WindowBounds,
    is_maximized: bool,
    is_minimized: bool,
    is_full_screen: bool,
    display_bounds: DisplayBounds,
    topology: Option<(Vec<Display>, Option<Display>)>,
}

impl Observation {
    pub fn take(window: &dyn ManagedWindow, screen: &dyn Screen) -> Result<Self> {
        let bounds = window.bounds().context("Failed to read window bounds")?;
        let is_maximized = window.is_maximized().context("Failed to read maximized state")?;
        let is_minimized = window.is_minimized().context("Failed to read minimized state")?;
        let is_full_screen = window.is_full_screen().context("Failed to read full-screen state")?;
        let display = screen
            .display_matching(&bounds.as_rect())
            .context("Failed to match window to a display")?;
        Ok(Self {
            bounds,
            is_maximized,
            is_minimized,
            is_full_screen,
            display_bounds: display.bounds,
            // only needed to re-check a normal-state sample
            topology: current_topology(screen).ok(),
        })
    }

    /// Not maximized, minimized or full-screen.
    pub fn is_normal(&self) -> bool {
        !self.is_maximized && !self.is_minimized && !self.is_full_screen
    }
}

/// Serializes `state` in the storage format and writes it under `key`.
pub fn write_snapshot(store: &dyn RecordStore, key: &str, state: &PersistedState) -> io::Result<()> {
    let bytes =
        serde_json::to_vec(state).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    store.write_record(key, &bytes)
}

/// Attached displays plus the primary (first display when the host can't name one).
pub fn current_topology(screen: &dyn Screen) -> Result<(Vec<Display>, Option<Display>)> {
    let displays = screen.all_displays().context("Failed to enumerate displays")?;
    let primary = screen.primary_display().ok().or_else(|| displays.first().copied());
    Ok((displays, primary))
}

#[derive(Debug, Clone)]
pub struct StateStore {
    current: PersistedState,
    last_persisted: Option<PersistedState>,
    config: Config,
}

impl StateStore {
    /// Reads and sanitizes the stored record, falling back to defaults.
    ///
    /// Never fails: an unreadable or invalid record is logged and treated as absent.
    pub fn load(store: &dyn RecordStore, config: &Config, screen: &dyn Screen, log: &AppLog) -> Self {
        let defaults = PersistedState::with_defaults(
            config.default_width,
            config.default_height,
            DisplayBounds::default(),
        );
        let fresh = |current: PersistedState| Self {
            current,
            last_persisted: None,
            config: config.clone(),
        };

        let bytes = match store.read_record(&config.storage_key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log.info("restore", "no_saved_state", None);
                return fresh(defaults);
            }
            Err(e) => {
                log.warn(
                    "restore",
                    "read_failed",
                    Some(json!({ "key": config.storage_key, "error": e.to_string() })),
                );
                return fresh(defaults);
            }
        };

        let Some(saved) = decode_record(&bytes, config.default_width, config.default_height) else {
            log.info("restore", "invalid_saved_state", Some(json!({ "key": config.storage_key })));
            return fresh(defaults);
        };

        let current = match current_topology(screen) {
            Ok((displays, primary)) => reconcile(&saved, &displays, primary.as_ref(), config),
            Err(e) => {
                log.warn("restore", "topology_unavailable", Some(json!({ "error": format!("{:#}", e) })));
                saved
            }
        };
        if current != saved {
            log.info(
                "restore",
                "reconciled",
                Some(json!({ "saved": saved, "restored": current })),
            );
        }

        Self {
            current,
            last_persisted: Some(saved),
            config: config.clone(),
        }
    }

    pub fn current(&self) -> &PersistedState {
        &self.current
    }

    pub fn last_persisted(&self) -> Option<&PersistedState> {
        self.last_persisted.as_ref()
    }

    pub fn has_changed(&self) -> bool {
        has_changed(&self.current, self.last_persisted.as_ref())
    }

    /// Replaces `current` wholesale; `last_persisted` is untouched.
    pub fn replace(&mut self, state: PersistedState) {
        self.current = state;
    }

    /// Folds a sample into `current`.
    ///
    /// Flags and display bounds always follow the sample; position and size only in the normal
    /// state, so the last restored geometry survives maximize/minimize/full-screen.
    pub fn apply(&mut self, observation: &Observation, log: &AppLog) {
        let mut next = self.current;
        if observation.is_normal() {
            next.window_bounds = observation.bounds;
        }
        next.is_maximized = observation.is_maximized;
        next.is_full_screen = observation.is_full_screen;
        next.display_bounds = observation.display_bounds;

        // a fresh normal-state sample may have landed off every display
        if observation.is_normal() {
            if let Some((displays, primary)) = observation.topology.as_ref() {
                let reconciled = reconcile(&next, displays, primary.as_ref(), &self.config);
                if reconciled != next {
                    log.info(
                        "observe",
                        "reconciled",
                        Some(json!({ "observed": next, "kept": reconciled })),
                    );
                }
                next = reconciled;
            }
        }
        self.current = next;
    }

    /// Samples the live window into `current`.
    ///
    /// Any failure querying the window or the displays leaves `current` untouched.
    pub fn apply_observation(&mut self, window: &dyn ManagedWindow, screen: &dyn Screen, log: &AppLog) {
        match Observation::take(window, screen) {
            Ok(observation) => self.apply(&observation, log),
            Err(e) => {
                log.warn("observe", "window_query_failed", Some(json!({ "error": format!("{:#}", e) })));
            }
        }
    }

    /// Snapshot of `current` when it differs from the last successful write.
    pub fn pending_write(&self) -> Option<PersistedState> {
        self.has_changed().then_some(self.current)
    }

    /// Records that `written` reached storage.
    pub fn mark_persisted(&mut self, written: PersistedState) {
        self.last_persisted = Some(written);
    }

    /// Writes `current` when it differs from the last successful write.
    ///
    /// Returns whether a write happened. A failed write leaves both snapshots as they were.
    pub fn persist(&mut self, store: &dyn RecordStore) -> io::Result<bool> {
        let Some(snapshot) = self.pending_write() else {
            return Ok(false);
        };
        write_snapshot(store, &self.config.storage_key, &snapshot)?;
        self.mark_persisted(snapshot);
        Ok(true)
    }
}
