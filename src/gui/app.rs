//! Editor window implemented with egui/eframe
//!
//! The window only reads published [`EditorView`] snapshots and forwards
//! input as [`EditorCommand`]s; all state lives in the session task.

use std::time::Duration;

use anyhow::{Result, anyhow};
use eframe::{CreationContext, NativeOptions, egui};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::constants::*;
use super::keymap;
use crate::config::EditorConfig;
use crate::constants::timing;
use crate::editor::{EditorCommand, EditorHandle, EditorView, PointerButton, PreviewGeometry, SaveIndicator, StepDirection};
use crate::types::Side;

const APP_TITLE: &str = "VS Offset Editor";

struct EditorApp {
    handle: EditorHandle,
    session: Option<JoinHandle<()>>,
    runtime: Handle,
    texture: Option<(u64, egui::TextureHandle)>,
    jump_text: String,
    page_text: String,
}

impl EditorApp {
    fn new(cc: &CreationContext<'_>, handle: EditorHandle, session: JoinHandle<()>, runtime: Handle) -> Self {
        info!("Initializing editor window");

        // Repaint as soon as the session publishes, not only on input
        let ctx = cc.egui_ctx.clone();
        let mut view = handle.view.clone();
        runtime.spawn(async move {
            while view.changed().await.is_ok() {
                ctx.request_repaint();
            }
        });

        Self {
            handle,
            session: Some(session),
            runtime,
            texture: None,
            jump_text: String::new(),
            page_text: String::new(),
        }
    }

    fn send(&self, command: EditorCommand) {
        if !self.handle.send(command) {
            debug!("Editor session has stopped, input dropped");
        }
    }

    /// Upload the preview only when a newer render arrived
    fn sync_texture(&mut self, ctx: &egui::Context, view: &EditorView) {
        let Some(preview) = &view.preview else {
            return;
        };
        if self.texture.as_ref().is_some_and(|(seq, _)| *seq == preview.seq) {
            return;
        }
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [preview.width as usize, preview.height as usize],
            &preview.rgba,
        );
        if let Some((seq, texture)) = &mut self.texture {
            texture.set(image, egui::TextureOptions::LINEAR);
            *seq = preview.seq;
        } else {
            let texture = ctx.load_texture("preview", image, egui::TextureOptions::LINEAR);
            self.texture = Some((preview.seq, texture));
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui, view: &EditorView) {
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = ITEM_SPACING;

            if ui.button("\u{25C0}").on_hover_text("Previous page (\u{2190})").clicked() {
                self.send(EditorCommand::PrevPage);
            }
            let page_label = match &view.page {
                Some(page) => format!("{}/{}  {} ({})", page.index, view.total_pages, page.character, page.side),
                None => "-".to_string(),
            };
            ui.label(egui::RichText::new(page_label).strong())
                .on_hover_text(format!("{} renders issued", view.renders_issued));
            if ui.button("\u{25B6}").on_hover_text("Next page (\u{2192})").clicked() {
                self.send(EditorCommand::NextPage);
            }

            let go = ui.add(
                egui::TextEdit::singleline(&mut self.page_text)
                    .hint_text("#")
                    .desired_width(PAGE_FIELD_WIDTH),
            );
            if go.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                if let Some(index) = parse_page_entry(&self.page_text) {
                    self.send(EditorCommand::GoToPage(index));
                }
                self.page_text.clear();
            }

            ui.separator();
            let jump = ui.add(
                egui::TextEdit::singleline(&mut self.jump_text)
                    .hint_text("Jump to character")
                    .desired_width(JUMP_FIELD_WIDTH),
            );
            if jump.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                self.jump(view);
            }

            ui.separator();
            let mut mirror = view.params.mirror;
            if ui.checkbox(&mut mirror, "Mirror").changed() {
                self.send(EditorCommand::SetMirror(mirror));
            }
            let mut use_other_side = view.params.use_other_side;
            if ui.checkbox(&mut use_other_side, "Use other side").changed() {
                self.send(EditorCommand::SetUseOtherSide(use_other_side));
            }

            ui.separator();
            ui.monospace(format!(
                "scale {:.2}  x {:+}  raise {:+}",
                view.params.scale, view.params.offset_x, view.params.raise
            ));

            ui.separator();
            let label = view.save_indicator.label();
            let save = match view.save_indicator {
                SaveIndicator::Saved => egui::Button::new(egui::RichText::new(label).color(SAVED_COLOR)),
                SaveIndicator::Idle => egui::Button::new(label),
            };
            if ui.add(save).on_hover_text("Save (Ctrl+S)").clicked() {
                self.send(EditorCommand::Save);
            }
            if ui.button("Reset").on_hover_text("Discard unsaved changes (R)").clicked() {
                self.send(EditorCommand::Reset);
            }
            if view.dirty {
                ui.colored_label(DIRTY_COLOR, "\u{25CF} unsaved");
            }
            if view.loading {
                ui.spinner();
            }
        });
    }

    /// Typing the current right-side character again jumps to its left side
    fn jump(&mut self, view: &EditorView) {
        let name = self.jump_text.trim();
        if name.is_empty() {
            return;
        }
        let side = match &view.page {
            Some(page) if page.side == Side::Right && page.character.eq_ignore_ascii_case(name) => Side::Left,
            _ => Side::Right,
        };
        self.send(EditorCommand::GoToCharacter {
            character: name.to_string(),
            side,
        });
        self.jump_text.clear();
    }

    fn preview(&self, ui: &mut egui::Ui, view: &EditorView) {
        let (Some(preview), Some((_, texture))) = (&view.preview, &self.texture) else {
            ui.centered_and_justified(|ui| {
                if view.loading {
                    ui.spinner();
                } else {
                    ui.label("No preview yet");
                }
            });
            return;
        };

        let natural = egui::vec2(preview.width as f32, preview.height as f32);
        let available = ui.available_size();
        let fit = (available.x / natural.x).min(available.y / natural.y).max(0.0);
        let size = natural * fit;
        let rect = egui::Rect::from_center_size(ui.max_rect().center(), size);
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        egui::Image::new((texture.id(), size)).paint_at(ui, rect);

        let geometry = PreviewGeometry {
            rendered_width: rect.width(),
            natural_width: preview.width,
            natural_height: preview.height,
        };

        if response.drag_started() {
            let origin = ui
                .input(|i| i.pointer.press_origin())
                .or(response.interact_pointer_pos());
            if let Some(pos) = origin {
                self.send(EditorCommand::PointerDown {
                    x: pos.x,
                    y: pos.y,
                    button: drag_button(&response),
                });
            }
        }
        if response.dragged() && response.drag_delta() != egui::Vec2::ZERO {
            if let Some(pos) = response.interact_pointer_pos() {
                self.send(EditorCommand::PointerMove {
                    x: pos.x,
                    y: pos.y,
                    geometry,
                });
            }
        }
        if response.drag_stopped() {
            self.send(EditorCommand::PointerUp);
        }

        if response.hovered() {
            for direction in wheel_notches(ui) {
                self.send(EditorCommand::Wheel(direction));
            }
        }
    }
}

/// Page numbers wrap in the session, so any integer is accepted
fn parse_page_entry(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

fn drag_button(response: &egui::Response) -> PointerButton {
    if response.drag_started_by(egui::PointerButton::Primary) {
        PointerButton::Primary
    } else if response.drag_started_by(egui::PointerButton::Secondary) {
        PointerButton::Secondary
    } else {
        PointerButton::Middle
    }
}

/// One step per wheel event; scrolling up grows the character
fn wheel_notches(ui: &egui::Ui) -> Vec<StepDirection> {
    ui.input(|i| {
        i.events
            .iter()
            .filter_map(|event| match event {
                egui::Event::MouseWheel { delta, .. } if delta.y > 0.0 => Some(StepDirection::Up),
                egui::Event::MouseWheel { delta, .. } if delta.y < 0.0 => Some(StepDirection::Down),
                _ => None,
            })
            .collect()
    })
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for command in keymap::take_shortcuts(ctx) {
            self.send(command);
        }

        let view = self.handle.view.borrow().clone();
        self.sync_texture(ctx, &view);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(ITEM_SPACING / 2.0);
            self.toolbar(ui, &view);
            ui.add_space(ITEM_SPACING / 2.0);
        });
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(PREVIEW_BACKGROUND).inner_margin(PREVIEW_MARGIN))
            .show(ctx, |ui| self.preview(ui, &view));

        ctx.request_repaint_after(Duration::from_millis(REPAINT_INTERVAL_MS));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.send(EditorCommand::Shutdown);
        if let Some(session) = self.session.take() {
            let grace = Duration::from_millis(timing::SHUTDOWN_GRACE_MS);
            let finished = self
                .runtime
                .block_on(async move { tokio::time::timeout(grace, session).await });
            match finished {
                Ok(Ok(())) => info!("Editor session finished"),
                Ok(Err(err)) => error!(error = ?err, "Editor session task failed"),
                Err(_) => warn!(grace_ms = timing::SHUTDOWN_GRACE_MS, "Editor session did not finish in time"),
            }
        }
        info!("Editor window exiting");
    }
}

pub fn run_gui(config: &EditorConfig, handle: EditorHandle, session: JoinHandle<()>, runtime: Handle) -> Result<()> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width as f32, config.window_height as f32])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title(APP_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(EditorApp::new(cc, handle, session, runtime)))),
    )
    .map_err(|err| anyhow!("Failed to launch editor window: {err}"))
}
