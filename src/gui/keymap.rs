//! Keyboard shortcuts
//!
//! Bound keys are pulled out of egui's event queue before any widget sees
//! them. Nothing is bound while a text field has keyboard focus.

use eframe::egui::{self, Key, Modifiers};

use crate::editor::{EditorCommand, StepDirection};

/// Command bound to a key press, if any
pub fn shortcut(key: Key, modifiers: Modifiers) -> Option<EditorCommand> {
    if modifiers.alt {
        return None;
    }
    let plain = !modifiers.command && !modifiers.ctrl;

    match key {
        Key::S => Some(EditorCommand::Save),
        _ if !plain => None,
        Key::ArrowLeft | Key::PageUp => Some(EditorCommand::PrevPage),
        Key::ArrowRight | Key::PageDown => Some(EditorCommand::NextPage),
        Key::Minus => Some(EditorCommand::NudgeScale(StepDirection::Down)),
        Key::Equals | Key::Plus => Some(EditorCommand::NudgeScale(StepDirection::Up)),
        Key::R => Some(EditorCommand::Reset),
        _ => None,
    }
}

/// Remove every bound key press from this frame's input and return its commands
pub fn take_shortcuts(ctx: &egui::Context) -> Vec<EditorCommand> {
    if ctx.wants_keyboard_input() {
        return Vec::new();
    }
    ctx.input_mut(|input| {
        let mut commands = Vec::new();
        input.events.retain(|event| {
            let egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } = event
            else {
                return true;
            };
            match shortcut(*key, *modifiers) {
                Some(command) => {
                    commands.push(command);
                    false
                }
                None => true,
            }
        });
        commands
    })
}
