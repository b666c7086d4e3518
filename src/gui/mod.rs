//! Editor window: preview surface, toolbar and keyboard shortcuts

mod app;
mod constants;
mod keymap;

pub use app::run_gui;
