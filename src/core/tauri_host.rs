//! [`ManagedWindow`] and [`Screen`] for a Tauri 2 `WebviewWindow`.

use crate::core::host::{EventHandler, ManagedWindow, Screen, Subscription, WindowEvent};
use crate::models::{Display, DisplayBounds, WindowBounds};
use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tauri::{Monitor, WebviewWindow};

type Listeners = HashMap<u64, (WindowEvent, EventHandler)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Listeners,
}

/// Tauri only lets us add window-event listeners, never remove them, so one listener is
/// installed up front and fans out to whatever is currently subscribed.
#[derive(Clone)]
pub struct TauriWindow {
    window: WebviewWindow,
    registry: Arc<Mutex<Registry>>,
}

impl TauriWindow {
    pub fn new(window: WebviewWindow) -> Self {
        let registry = Arc::new(Mutex::new(Registry::default()));
        let dispatch = Arc::clone(&registry);
        window.on_window_event(move |event| {
            let kind = match event {
                tauri::WindowEvent::Resized(_) => WindowEvent::Resize,
                tauri::WindowEvent::Moved(_) => WindowEvent::Move,
                tauri::WindowEvent::CloseRequested { .. } => WindowEvent::Close,
                tauri::WindowEvent::Destroyed => WindowEvent::Destroyed,
                _ => return,
            };
            let handlers: Vec<EventHandler> = dispatch
                .lock()
                .listeners
                .values()
                .filter(|(e, _)| *e == kind)
                .map(|(_, h)| Arc::clone(h))
                .collect();
            for handler in handlers {
                handler();
            }
        });
        Self { window, registry }
    }

    pub fn window(&self) -> &WebviewWindow {
        &self.window
    }
}

impl ManagedWindow for TauriWindow {
    fn bounds(&self) -> Result<WindowBounds> {
        let pos = self.window.outer_position()?;
        let size = self.window.outer_size()?;
        Ok(WindowBounds::new(
            pos.x,
            pos.y,
            i32::try_from(size.width)?,
            i32::try_from(size.height)?,
        ))
    }

    fn is_maximized(&self) -> Result<bool> {
        Ok(self.window.is_maximized()?)
    }

    fn is_minimized(&self) -> Result<bool> {
        Ok(self.window.is_minimized()?)
    }

    fn is_full_screen(&self) -> Result<bool> {
        Ok(self.window.is_fullscreen()?)
    }

    fn maximize(&self) -> Result<()> {
        Ok(self.window.maximize()?)
    }

    fn set_full_screen(&self, full_screen: bool) -> Result<()> {
        Ok(self.window.set_fullscreen(full_screen)?)
    }

    fn subscribe(&self, event: WindowEvent, handler: EventHandler) -> Result<Subscription> {
        let id = {
            let mut registry = self.registry.lock();
            registry.next_id = registry.next_id.wrapping_add(1);
            let id = registry.next_id;
            registry.listeners.insert(id, (event, handler));
            id
        };
        let registry = Arc::clone(&self.registry);
        Ok(Subscription::new(move || {
            registry.lock().listeners.remove(&id);
        }))
    }
}

fn to_display(index: usize, monitor: &Monitor) -> Result<Display> {
    let pos = monitor.position();
    let size = monitor.size();
    let area = monitor.work_area();
    Ok(Display::new(
        u32::try_from(index)?,
        DisplayBounds::new(pos.x, pos.y, i32::try_from(size.width)?, i32::try_from(size.height)?),
        DisplayBounds::new(
            area.position.x,
            area.position.y,
            i32::try_from(area.size.width)?,
            i32::try_from(area.size.height)?,
        ),
    ))
}

fn same_monitor(a: &Monitor, b: &Monitor) -> bool {
    a.position() == b.position() && a.size() == b.size() && a.name() == b.name()
}

impl Screen for TauriWindow {
    fn all_displays(&self) -> Result<Vec<Display>> {
        self.window
            .available_monitors()?
            .iter()
            .enumerate()
            .map(|(i, m)| to_display(i, m))
            .collect()
    }

    fn primary_display(&self) -> Result<Display> {
        let primary = self
            .window
            .primary_monitor()?
            .ok_or_else(|| anyhow!("Primary monitor not found"))?;
        let monitors = self.window.available_monitors()?;
        let index = monitors
            .iter()
            .position(|m| same_monitor(m, &primary))
            .unwrap_or(0);
        to_display(index, &primary)
    }
}
