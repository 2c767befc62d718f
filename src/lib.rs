//! Restores and persists a single window's geometry across restarts, keeping the saved record
//! valid as monitors come and go.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use window_keeper::{Config, Keeper, ManagedWindow, Screen};
//! # fn host() -> (Arc<dyn Screen>, Arc<dyn ManagedWindow>) { unimplemented!() }
//! # async fn run() -> anyhow::Result<()> {
//! let (screen, window) = host();
//! let keeper = Keeper::create(Config::default(), screen);
//! let restored = keeper.current_state();
//! // size and place the window from `restored.window_bounds`, then:
//! keeper.attach(window)?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod models;

pub use crate::core::{
    AppLog, AppLogRecord, EventHandler, FileStore, Keeper, ManagedWindow, MemoryStore,
    RecordStore, Screen, Subscription, WindowEvent,
};
pub use crate::models::{Config, Display, DisplayBounds, PersistedState, WindowBounds};

#[cfg(feature = "tauri")]
pub use crate::core::tauri_host::TauriWindow;
