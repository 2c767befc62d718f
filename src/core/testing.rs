//! In-process stand-ins for the host window, display and storage collaborators.

use crate::core::host::{EventHandler, ManagedWindow, Screen, Subscription, WindowEvent};
use crate::core::persistence::{MemoryStore, RecordStore};
use crate::models::{Display, DisplayBounds, WindowBounds};
use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct FakeWindowState {
    bounds: Option<WindowBounds>,
    maximized: bool,
    minimized: bool,
    full_screen: bool,
    destroyed: bool,
    maximize_calls: usize,
    full_screen_calls: Vec<bool>,
    bounds_queries: usize,
}

type Handlers = HashMap<u64, (WindowEvent, EventHandler)>;

#[derive(Default)]
pub struct FakeWindow {
    state: Mutex<FakeWindowState>,
    handlers: Arc<Mutex<Handlers>>,
    next_id: Mutex<u64>,
}

impl FakeWindow {
    pub fn new(bounds: WindowBounds) -> Arc<Self> {
        let window = Self::default();
        window.state.lock().bounds = Some(bounds);
        Arc::new(window)
    }

    pub fn set_bounds(&self, bounds: WindowBounds) {
        self.state.lock().bounds = Some(bounds);
    }

    pub fn set_maximized(&self, maximized: bool) {
        self.state.lock().maximized = maximized;
    }

    pub fn set_minimized(&self, minimized: bool) {
        self.state.lock().minimized = minimized;
    }

    pub fn destroy(&self) {
        self.state.lock().destroyed = true;
    }

    pub fn maximize_calls(&self) -> usize {
        self.state.lock().maximize_calls
    }

    pub fn full_screen_calls(&self) -> Vec<bool> {
        self.state.lock().full_screen_calls.clone()
    }

    pub fn bounds_queries(&self) -> usize {
        self.state.lock().bounds_queries
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Delivers `event` to every subscriber, like the host's event loop would.
    pub fn emit(&self, event: WindowEvent) {
        let handlers: Vec<EventHandler> = self
            .handlers
            .lock()
            .values()
            .filter(|(e, _)| *e == event)
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    fn alive(&self) -> Result<parking_lot::MutexGuard<'_, FakeWindowState>> {
        let state = self.state.lock();
        if state.destroyed {
            return Err(anyhow!("window has been destroyed"));
        }
        Ok(state)
    }
}

impl ManagedWindow for FakeWindow {
    fn bounds(&self) -> Result<WindowBounds> {
        let mut state = self.alive()?;
        state.bounds_queries += 1;
        state.bounds.ok_or_else(|| anyhow!("no bounds"))
    }

    fn is_maximized(&self) -> Result<bool> {
        Ok(self.alive()?.maximized)
    }

    fn is_minimized(&self) -> Result<bool> {
        Ok(self.alive()?.minimized)
    }

    fn is_full_screen(&self) -> Result<bool> {
        Ok(self.alive()?.full_screen)
    }

    fn maximize(&self) -> Result<()> {
        let mut state = self.alive()?;
        state.maximize_calls += 1;
        state.maximized = true;
        Ok(())
    }

    fn set_full_screen(&self, full_screen: bool) -> Result<()> {
        let mut state = self.alive()?;
        state.full_screen_calls.push(full_screen);
        state.full_screen = full_screen;
        Ok(())
    }

    fn subscribe(&self, event: WindowEvent, handler: EventHandler) -> Result<Subscription> {
        self.alive()?;
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };
        self.handlers.lock().insert(id, (event, handler));
        let handlers = Arc::clone(&self.handlers);
        Ok(Subscription::new(move || {
            handlers.lock().remove(&id);
        }))
    }
}

pub struct FakeScreen {
    displays: Mutex<Vec<Display>>,
    broken: bool,
}

impl FakeScreen {
    pub fn with_displays(displays: Vec<Display>) -> Self {
        Self {
            displays: Mutex::new(displays),
            broken: false,
        }
    }

    /// 1920×1080 with a 40px taskbar at the bottom.
    pub fn single() -> Self {
        Self::with_displays(vec![Display::new(
            1,
            DisplayBounds::new(0, 0, 1920, 1080),
            DisplayBounds::new(0, 0, 1920, 1040),
        )])
    }

    /// `single()` plus a 2560×1440 display to its right with a 25px menu bar.
    pub fn dual() -> Self {
        let screen = Self::single();
        screen.displays.lock().push(Display::new(
            2,
            DisplayBounds::new(1920, 0, 2560, 1440),
            DisplayBounds::new(1920, 25, 2560, 1415),
        ));
        screen
    }

    pub fn broken() -> Self {
        Self {
            displays: Mutex::new(Vec::new()),
            broken: true,
        }
    }

    pub fn set_displays(&self, displays: Vec<Display>) {
        *self.displays.lock() = displays;
    }
}

impl Screen for FakeScreen {
    fn all_displays(&self) -> Result<Vec<Display>> {
        if self.broken {
            return Err(anyhow!("display enumeration unavailable"));
        }
        Ok(self.displays.lock().clone())
    }

    fn primary_display(&self) -> Result<Display> {
        self.all_displays()?
            .first()
            .copied()
            .ok_or_else(|| anyhow!("no primary display"))
    }
}

/// Storage whose every read and write fails.
pub struct FailingStore;

impl RecordStore for FailingStore {
    fn read_record(&self, _key: &str) -> io::Result<Option<Vec<u8>>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read denied"))
    }

    fn write_record(&self, _key: &str, _bytes: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }
}

/// One-shot rendezvous: the first gated call announces itself, then waits to be let through.
pub struct Gate {
    armed: AtomicBool,
    entered_tx: Mutex<Sender<()>>,
    entered_rx: Mutex<Receiver<()>>,
    release_tx: Mutex<Sender<()>>,
    release_rx: Mutex<Receiver<()>>,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        Arc::new(Self {
            armed: AtomicBool::new(true),
            entered_tx: Mutex::new(entered_tx),
            entered_rx: Mutex::new(entered_rx),
            release_tx: Mutex::new(release_tx),
            release_rx: Mutex::new(release_rx),
        })
    }

    fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            let _ = self.entered_tx.lock().send(());
            // bounded so a broken test fails instead of hanging
            let _ = self.release_rx.lock().recv_timeout(Duration::from_secs(5));
        }
    }

    /// Whether a gated call is (or was) parked at the gate within `timeout`.
    pub fn wait_entered(&self, timeout: Duration) -> bool {
        self.entered_rx.lock().recv_timeout(timeout).is_ok()
    }

    pub fn release(&self) {
        let _ = self.release_tx.lock().send(());
    }
}

/// [`FakeWindow`] whose first `bounds()` query parks at a [`Gate`], like a host getter
/// round-tripping through a busy UI thread.
pub struct GatedWindow {
    pub inner: Arc<FakeWindow>,
    gate: Arc<Gate>,
}

impl GatedWindow {
    pub fn new(bounds: WindowBounds, gate: Arc<Gate>) -> Arc<Self> {
        Arc::new(Self {
            inner: FakeWindow::new(bounds),
            gate,
        })
    }
}

impl ManagedWindow for GatedWindow {
    fn bounds(&self) -> Result<WindowBounds> {
        self.gate.pass();
        self.inner.bounds()
    }

    fn is_maximized(&self) -> Result<bool> {
        self.inner.is_maximized()
    }

    fn is_minimized(&self) -> Result<bool> {
        self.inner.is_minimized()
    }

    fn is_full_screen(&self) -> Result<bool> {
        self.inner.is_full_screen()
    }

    fn maximize(&self) -> Result<()> {
        self.inner.maximize()
    }

    fn set_full_screen(&self, full_screen: bool) -> Result<()> {
        self.inner.set_full_screen(full_screen)
    }

    fn subscribe(&self, event: WindowEvent, handler: EventHandler) -> Result<Subscription> {
        self.inner.subscribe(event, handler)
    }
}

/// [`MemoryStore`] whose first write parks at a [`Gate`].
pub struct GatedStore {
    pub inner: MemoryStore,
    gate: Arc<Gate>,
}

impl GatedStore {
    pub fn new(gate: Arc<Gate>) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            gate,
        })
    }
}

impl RecordStore for GatedStore {
    fn read_record(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        self.inner.read_record(key)
    }

    fn write_record(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.gate.pass();
        self.inner.write_record(key, bytes)
    }
}
