//! GUI-specific constants for layout, colors and intervals

use eframe::egui;

/// Editor window limits
pub const WINDOW_MIN_WIDTH: f32 = 640.0;
pub const WINDOW_MIN_HEIGHT: f32 = 420.0;

/// Layout spacing
pub const ITEM_SPACING: f32 = 8.0;
pub const PREVIEW_MARGIN: f32 = 6.0;
pub const JUMP_FIELD_WIDTH: f32 = 140.0;
pub const PAGE_FIELD_WIDTH: f32 = 48.0;

/// Status colors
pub const DIRTY_COLOR: egui::Color32 = egui::Color32::from_rgb(230, 160, 0);
pub const SAVED_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const PREVIEW_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(24, 24, 24);

/// Fallback repaint cadence while idle
pub const REPAINT_INTERVAL_MS: u64 = 250;
