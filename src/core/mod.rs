pub mod app_log;
pub mod debounce;
pub mod host;
pub mod keeper;
pub mod persistence;
pub mod reconcile;
pub mod state_store;
pub mod validator;

#[cfg(feature = "tauri")]
pub mod tauri_host;

#[cfg(test)]
pub(crate) mod testing;

pub use app_log::{AppLog, AppLogRecord};
pub use host::{EventHandler, ManagedWindow, Screen, Subscription, WindowEvent};
pub use keeper::Keeper;
pub use persistence::{FileStore, MemoryStore, RecordStore};
pub use state_store::{has_changed, write_snapshot, Observation, StateStore};
