use serde::{Deserialize, Serialize};

/// Outer geometry of the managed window.
///
/// `x`/`y` are `None` when the host should pick a default placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub width: i32,
    pub height: i32,
    pub x: Option<i32>,
    pub y: Option<i32>,
}

impl WindowBounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            x: Some(x),
            y: Some(y),
        }
    }

    /// Size only; the host decides where the window goes.
    pub fn unplaced(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            x: None,
            y: None,
        }
    }

    pub fn left(&self) -> i32 {
        self.x.unwrap_or(0)
    }

    pub fn top(&self) -> i32 {
        self.y.unwrap_or(0)
    }

    pub fn right(&self) -> i32 {
        self.left().saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.top().saturating_add(self.height)
    }

    pub fn as_rect(&self) -> DisplayBounds {
        DisplayBounds {
            width: self.width,
            height: self.height,
            x: self.left(),
            y: self.top(),
        }
    }
}

/// A rectangle in global screen coordinates: either a display's full bounds or its work area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayBounds {
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
}

impl DisplayBounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            x,
            y,
        }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Area of the intersection with `other`, zero when they don't touch.
    pub fn overlap_area(&self, other: &DisplayBounds) -> i64 {
        let w = i64::from(self.right().min(other.right())) - i64::from(self.x.max(other.x));
        let h = i64::from(self.bottom().min(other.bottom())) - i64::from(self.y.max(other.y));
        if w <= 0 || h <= 0 {
            return 0;
        }
        w * h
    }
}

/// An attached display as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Display {
    pub id: u32,
    pub bounds: DisplayBounds,
    /// Usable area excluding taskbars, docks and menu bars.
    pub work_area: DisplayBounds,
}

impl Display {
    pub fn new(id: u32, bounds: DisplayBounds, work_area: DisplayBounds) -> Self {
        Self {
            id,
            bounds,
            work_area,
        }
    }
}
