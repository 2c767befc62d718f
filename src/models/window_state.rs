use serde::{Deserialize, Serialize};

use super::{DisplayBounds, WindowBounds};

/// The durable record for one managed window.
///
/// While `is_maximized` or `is_full_screen` is set, `window_bounds` holds the last restored
/// geometry and must not be used for placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub window_bounds: WindowBounds,
    #[serde(default)]
    pub display_bounds: DisplayBounds,
    #[serde(default)]
    pub is_maximized: bool,
    #[serde(default)]
    pub is_full_screen: bool,
}

impl PersistedState {
    /// Default-sized, host-placed, not maximized or full-screen.
    pub fn with_defaults(width: i32, height: i32, display_bounds: DisplayBounds) -> Self {
        Self {
            window_bounds: WindowBounds::unplaced(width, height),
            display_bounds,
            is_maximized: false,
            is_full_screen: false,
        }
    }

    /// Neither maximized nor full-screen, so `window_bounds` drives placement.
    pub fn is_normal(&self) -> bool {
        !self.is_maximized && !self.is_full_screen
    }
}
