//! Traits the keeper consumes from the host windowing system.

use crate::models::{Display, DisplayBounds, WindowBounds};
use anyhow::{anyhow, Result};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowEvent {
    Resize,
    Move,
    Close,
    Destroyed,
}

impl WindowEvent {
    pub const ALL: [WindowEvent; 4] = [
        WindowEvent::Resize,
        WindowEvent::Move,
        WindowEvent::Close,
        WindowEvent::Destroyed,
    ];
}

pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

/// Live registration of an [`EventHandler`]; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// A live window the keeper can observe and restore.
///
/// Every query may fail, e.g. when the window was destroyed underneath us.
pub trait ManagedWindow: Send + Sync {
    /// Outer bounds in global screen coordinates, position always set.
    fn bounds(&self) -> Result<WindowBounds>;
    fn is_maximized(&self) -> Result<bool>;
    fn is_minimized(&self) -> Result<bool>;
    fn is_full_screen(&self) -> Result<bool>;
    fn maximize(&self) -> Result<()>;
    fn set_full_screen(&self, full_screen: bool) -> Result<()>;
    fn subscribe(&self, event: WindowEvent, handler: EventHandler) -> Result<Subscription>;
}

pub trait Screen: Send + Sync {
    /// Attached displays in host enumeration order.
    fn all_displays(&self) -> Result<Vec<Display>>;
    fn primary_display(&self) -> Result<Display>;

    /// The display `rect` overlaps most; the primary display when it overlaps none.
    fn display_matching(&self, rect: &DisplayBounds) -> Result<Display> {
        let displays = self.all_displays()?;
        let best = displays
            .iter()
            .map(|d| (d.bounds.overlap_area(rect), d))
            .filter(|(area, _)| *area > 0)
            .fold(None::<(i64, &Display)>, |best, cur| match best {
                Some(b) if b.0 >= cur.0 => Some(b),
                _ => Some(cur),
            });
        match best {
            Some((_, display)) => Ok(*display),
            None => self
                .primary_display()
                .or_else(|_| displays.first().copied().ok_or_else(|| anyhow!("no displays attached"))),
        }
    }
}
