// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pan/zoom state of the canvas.
//!
//! A canvas point `p` is drawn at `p * zoom + (dx, dy)` on screen.

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest zoom level
pub const MIN_ZOOM: f32 = 0.1;
/// Largest zoom level
pub const MAX_ZOOM: f32 = 4.0;
/// Zoom multiplier for one wheel step outwards
pub const ZOOM_OUT_FACTOR: f32 = 0.8;
/// Zoom multiplier for one wheel step inwards
pub const ZOOM_IN_FACTOR: f32 = 1.25;

/// Canvas pan offset and magnification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    /// Horizontal screen offset
    pub dx: f32,
    /// Vertical screen offset
    pub dy: f32,
    /// Magnification
    pub zoom: f32,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transformation {
    /// No pan, no zoom
    pub const IDENTITY: Self = Self {
        dx: 0.0,
        dy: 0.0,
        zoom: 1.0,
    };

    /// Create a new transformation
    pub fn new(dx: f32, dy: f32, zoom: f32) -> Self {
        Self { dx, dy, zoom }
    }

    /// Screen offset as a vector
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.dx, self.dy)
    }

    /// Convert screen position to canvas position
    pub fn screen_to_canvas(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.offset()) / self.zoom).to_pos2()
    }

    /// Convert canvas position to screen position
    pub fn canvas_to_screen(&self, canvas: Pos2) -> Pos2 {
        (canvas.to_vec2() * self.zoom + self.offset()).to_pos2()
    }

    /// Convert a screen delta to a canvas delta (for drag operations)
    pub fn delta_to_canvas(&self, delta: Vec2) -> Vec2 {
        delta / self.zoom
    }

    /// Same transformation with zoom clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    ///
    /// Non-finite components fall back to the identity's.
    pub fn clamped(&self) -> Self {
        let finite_or = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
        Self::new(
            finite_or(self.dx, 0.0),
            finite_or(self.dy, 0.0),
            finite_or(self.zoom, 1.0).clamp(MIN_ZOOM, MAX_ZOOM),
        )
    }

    /// Shift the pan offset by a screen delta, leaving zoom unchanged
    pub fn panned(&self, delta: Vec2) -> Self {
        Self::new(self.dx + delta.x, self.dy + delta.y, self.zoom)
    }

    /// Multiply zoom by `factor` while keeping the canvas point under `cursor` fixed.
    ///
    /// The resulting zoom is clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    pub fn zoomed_at(&self, cursor: Pos2, factor: f32) -> Self {
        let zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let anchored = self.screen_to_canvas(cursor);
        let offset = cursor.to_vec2() - anchored.to_vec2() * zoom;
        Self::new(offset.x, offset.y, zoom)
    }
}

/// Zoom factor for a wheel delta. Positive deltas zoom out.
pub fn wheel_zoom_factor(delta_y: f32) -> Option<f32> {
    if delta_y > 0.0 {
        Some(ZOOM_OUT_FACTOR)
    } else if delta_y < 0.0 {
        Some(ZOOM_IN_FACTOR)
    } else {
        None
    }
}
