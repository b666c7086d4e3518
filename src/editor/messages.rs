//! Message types for GUI ↔ editor session communication

use std::sync::Arc;

use crate::page::Page;
use crate::types::{ParameterSet, RenderRequest, Side};

/// Pointer button as reported by the input surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Direction of a scale step (wheel notch or fine nudge)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Up,
    Down,
}

impl StepDirection {
    pub fn sign(self) -> f64 {
        match self {
            StepDirection::Up => 1.0,
            StepDirection::Down => -1.0,
        }
    }
}

/// How the preview is currently laid out on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewGeometry {
    /// Width the image is drawn at, in screen points
    pub rendered_width: f32,
    /// Decoded image size in pixels
    pub natural_width: u32,
    pub natural_height: u32,
}

/// Input sent from the GUI to the session
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    /// Pointer pressed over the preview (screen points)
    PointerDown { x: f32, y: f32, button: PointerButton },

    /// Pointer moved while over or dragging the preview
    PointerMove { x: f32, y: f32, geometry: PreviewGeometry },

    PointerUp,

    /// One scroll-wheel notch over the preview
    Wheel(StepDirection),

    /// Fine scale adjustment from the keyboard
    NudgeScale(StepDirection),

    SetMirror(bool),
    SetUseOtherSide(bool),

    NextPage,
    PrevPage,
    GoToPage(i64),
    GoToCharacter { character: String, side: Side },

    Save,
    Reset,

    /// Flush pending work and stop the session
    Shutdown,
}

/// State of the save button acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveIndicator {
    #[default]
    Idle,
    Saved,
}

impl SaveIndicator {
    pub fn label(self) -> &'static str {
        match self {
            SaveIndicator::Idle => "Save",
            SaveIndicator::Saved => "Saved",
        }
    }
}

/// A decoded render and the parameters it reflects
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub seq: u64,
    pub request: RenderRequest,
    pub width: u32,
    pub height: u32,
    /// Unpremultiplied RGBA8, row-major
    pub rgba: Vec<u8>,
}

/// Snapshot of the session published after every event
#[derive(Debug, Clone, Default)]
pub struct EditorView {
    pub page: Option<Page>,
    pub total_pages: i64,
    pub params: ParameterSet,
    pub dirty: bool,
    pub loading: bool,
    pub save_indicator: SaveIndicator,
    pub preview: Option<Arc<Preview>>,
    /// Renders issued so far this session
    pub renders_issued: u64,
}
