pub mod bounds;
pub mod config;
pub mod window_state;

pub use bounds::{Display, DisplayBounds, WindowBounds};
pub use config::Config;
pub use window_state::PersistedState;
