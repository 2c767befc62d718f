use crate::core::validator::is_valid_bounds;
use crate::models::{Config, Display, DisplayBounds, PersistedState, WindowBounds};

/// Full containment; an unset position counts as the origin.
pub fn window_fits_within(wb: &WindowBounds, bounds: &DisplayBounds) -> bool {
    wb.left() >= bounds.x
        && wb.top() >= bounds.y
        && wb.right() <= bounds.right()
        && wb.bottom() <= bounds.bottom()
}

/// Pulls `wb` inside the display's work area.
///
/// Size is shrunk first so the edge corrections below see the final dimensions. Each edge check
/// is independent: left, right, top, bottom.
pub fn clamp_to_work_area(wb: &WindowBounds, display: &Display) -> WindowBounds {
    let area = &display.work_area;
    let mut out = *wb;

    if out.width > area.width {
        out.width = area.width;
    }
    if out.height > area.height {
        out.height = area.height;
    }

    if out.left() < area.x {
        out.x = Some(area.x);
    }
    if out.right() > area.right() {
        out.x = Some(area.right() - out.width);
    }
    // On an origin display with a top menu bar, area.y == bounds.height - area.height. Using the
    // work area's own y also holds for bottom taskbars and displays offset in global space.
    if out.top() < area.y {
        out.y = Some(area.y);
    }
    if out.bottom() > area.bottom() {
        out.y = Some(area.bottom() - out.height);
    }

    out
}

pub fn find_containing_display<'a>(wb: &WindowBounds, displays: &'a [Display]) -> Option<&'a Display> {
    displays.iter().find(|d| window_fits_within(wb, &d.bounds))
}

/// Total reset used when a geometry fits no attached display.
pub fn default_state(config: &Config, primary: Option<&Display>) -> PersistedState {
    PersistedState::with_defaults(
        config.default_width,
        config.default_height,
        primary.map(|d| d.bounds).unwrap_or_default(),
    )
}

/// Validates `state` against the attached displays, clamping it into the first display that
/// contains it or resetting it to defaults when none does.
///
/// States without usable bounds (valid only through a maximized/full-screen flag) are returned
/// as-is.
pub fn reconcile(
    state: &PersistedState,
    displays: &[Display],
    primary: Option<&Display>,
    config: &Config,
) -> PersistedState {
    if !is_valid_bounds(&state.window_bounds) {
        return *state;
    }

    let Some(display) = find_containing_display(&state.window_bounds, displays) else {
        return default_state(config, primary);
    };

    let mut out = *state;
    if out.is_normal() {
        out.window_bounds = clamp_to_work_area(&state.window_bounds, display);
    }
    out
}
