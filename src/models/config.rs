use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_STORAGE_KEY: &str = "window-state.json";
const DEFAULT_STORAGE_DIR_NAME: &str = "window-keeper";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the state file. Falls back to the platform's local data dir.
    pub storage_location: Option<PathBuf>,
    /// File name of the state record inside `storage_location`.
    pub storage_key: String,
    pub default_width: i32,
    pub default_height: i32,
    pub restore_maximize: bool,
    pub restore_full_screen: bool,
    /// Directory for rotating JSON-lines log records. When unset, records go to stderr if
    /// `log_stderr` is set and are dropped otherwise.
    pub log_dir: Option<PathBuf>,
    pub log_stderr: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_location: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            default_width: 800,
            default_height: 600,
            restore_maximize: true,
            restore_full_screen: true,
            log_dir: None,
            log_stderr: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage_dir(&self) -> PathBuf {
        if let Some(dir) = self.storage_location.as_ref() {
            return dir.clone();
        }
        dirs::data_local_dir()
            .map(|dir| dir.join(DEFAULT_STORAGE_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
