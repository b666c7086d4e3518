//! Pointer interaction math
//!
//! Screen-space drags map into the 1920x1080 reference frame the offsets are
//! stored in: undo the on-screen display scale, then the ratio between the
//! image's native size and the reference frame.

use super::messages::PreviewGeometry;
use crate::constants::reference;

/// Where a drag started and what the offsets were at that moment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOrigin {
    pub x: f32,
    pub y: f32,
    pub offset_x: i32,
    pub raise: i32,
}

impl PreviewGeometry {
    /// Screen points per image pixel
    pub fn display_scale(&self) -> f64 {
        self.rendered_width as f64 / self.natural_width as f64
    }

    /// Image pixels per reference pixel, horizontally and vertically
    pub fn reference_scale(&self) -> (f64, f64) {
        (
            self.natural_width as f64 / reference::WIDTH,
            self.natural_height as f64 / reference::HEIGHT,
        )
    }

    fn is_usable(&self) -> bool {
        self.rendered_width.is_finite()
            && self.rendered_width > 0.0
            && self.natural_width > 0
            && self.natural_height > 0
    }
}

/// New `(offset_x, raise)` for a pointer at `(x, y)`.
///
/// Screen y grows downwards while `raise` grows upwards, so the vertical delta
/// is negated. Returns `None` when the geometry cannot be used (nothing drawn).
pub fn drag_offsets(origin: &DragOrigin, x: f32, y: f32, geometry: &PreviewGeometry) -> Option<(i32, i32)> {
    if !geometry.is_usable() {
        return None;
    }
    let display = geometry.display_scale();
    let (ref_x, ref_y) = geometry.reference_scale();

    let dx = (x - origin.x) as f64;
    let dy = (y - origin.y) as f64;

    let offset_x = origin.offset_x.saturating_add((dx / display / ref_x).round() as i32);
    let raise = origin.raise.saturating_add((-dy / display / ref_y).round() as i32);
    Some((offset_x, raise))
}
