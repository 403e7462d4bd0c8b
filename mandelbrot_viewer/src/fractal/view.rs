//! Pan and zoom of the visible region of the complex plane.
//!
//! All positions are in physical pixels with the origin at the bottom-left corner of the
//! output and y growing upwards.

use spirv_std::glam::Vec2;

/// Height (and width, on wide outputs) of the region shown by [`ViewState::initial`].
const INITIAL_EXTENT: f32 = 3.0;
const INITIAL_LOWER_LEFT: Vec2 = Vec2::new(-2.5, -1.5);

/// Maps pixels to world coordinates: `world = lower_left + scale * pixel`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    /// World units per pixel. Always positive.
    pub scale: f32,
    pub lower_left: Vec2,
}

impl ViewState {
    /// Fits `x in [-2.5, 0.5], y in [-1.5, 1.5]` into the output whatever its aspect ratio.
    pub fn initial(width: u32, height: u32) -> Self {
        Self {
            scale: INITIAL_EXTENT / width.min(height).max(1) as f32,
            lower_left: INITIAL_LOWER_LEFT,
        }
    }

    pub fn pixel_to_world(&self, pixel: Vec2) -> Vec2 {
        self.lower_left + self.scale * pixel
    }
}

/// Primary button state sampled once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    pub down: bool,
    pub just_pressed: bool,
    pub position: Vec2,
}

/// Pan delta for this frame. A fresh press only records the position so the view does not
/// jump from wherever the pointer was last seen.
pub fn pan_delta(pointer: &PointerState, last_pointer: Vec2) -> Vec2 {
    if pointer.down && !pointer.just_pressed {
        pointer.position - last_pointer
    } else {
        Vec2::ZERO
    }
}

/// Applies one frame of input to `view`.
///
/// Returns the new view and whether anything moved. Zoom is anchored at the pointer: the
/// world point under it is the same before and after.
pub fn update(
    view: ViewState,
    pointer: &PointerState,
    last_pointer: Vec2,
    scroll_delta: f32,
    sensitivity: f32,
) -> (ViewState, bool) {
    let pan = pan_delta(pointer, last_pointer);
    let scroll = scroll_delta * sensitivity;

    if pan == Vec2::ZERO && scroll == 0.0 {
        return (view, false);
    }

    let mut next = view;
    next.lower_left -= pan * next.scale;

    next.scale /= 1.0 + scroll;
    next.lower_left += scroll * next.scale * pointer.position;

    (next, true)
}

/// Owns the view and the pointer position remembered between frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTracker {
    view: ViewState,
    last_pointer: Vec2,
}

impl ViewTracker {
    pub fn new(view: ViewState) -> Self {
        Self {
            view,
            last_pointer: Vec2::ZERO,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    /// Jumps to `view`. A held pointer keeps panning relative to where it was last seen.
    pub fn reset(&mut self, view: ViewState) {
        self.view = view;
    }

    /// Feeds one frame of input. Returns `true` when the view changed.
    pub fn step(&mut self, pointer: &PointerState, scroll_delta: f32, sensitivity: f32) -> bool {
        let (view, changed) = update(
            self.view,
            pointer,
            self.last_pointer,
            scroll_delta,
            sensitivity,
        );
        if pointer.down {
            self.last_pointer = pointer.position;
        }
        self.view = view;
        changed
    }
}
