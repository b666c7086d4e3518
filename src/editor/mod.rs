//! Offset editor session
//!
//! One session owns one page's working values and drives the four editor
//! server collaborators. It runs as a single task: GUI input arrives as
//! [`EditorCommand`]s, state leaves as [`EditorView`] snapshots. Commit, save,
//! reset and page loads are awaited in the loop so they never interleave;
//! renders are spawned so input keeps flowing while an image is in flight.

pub mod input;
pub mod messages;
pub mod render;

use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::backend::EditorBackend;
use crate::constants::{scale, timing};
use crate::page::{Page, PageModel};
use crate::params::{ParamEdit, ParameterState, step_scale};
use crate::scheduler::{EdgeScheduler, sleep_until_deadline};
use crate::types::{PageBaseline, PageValues, RenderRequest, Side};

use input::{DragOrigin, drag_offsets};
pub use messages::{EditorCommand, EditorView, PointerButton, PreviewGeometry, SaveIndicator, StepDirection};
use render::{RenderCompletion, RenderPipeline, spawn_render};

/// Timer windows for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    pub render_throttle: Duration,
    pub autosave_delay: Duration,
    pub saved_flash: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            render_throttle: Duration::from_millis(timing::RENDER_THROTTLE_MS),
            autosave_delay: Duration::from_millis(timing::AUTOSAVE_DELAY_MS),
            saved_flash: Duration::from_millis(timing::SAVED_FLASH_MS),
        }
    }
}

/// Page the session opens on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPage {
    Index(i64),
    Character { character: String, side: Side },
}

impl Default for StartPage {
    fn default() -> Self {
        StartPage::Index(0)
    }
}

/// GUI side of a running session
#[derive(Debug, Clone)]
pub struct EditorHandle {
    pub commands: mpsc::UnboundedSender<EditorCommand>,
    pub view: watch::Receiver<EditorView>,
}

impl EditorHandle {
    /// Queue a command; false once the session has stopped
    pub fn send(&self, command: EditorCommand) -> bool {
        self.commands.send(command).is_ok()
    }
}

pub struct EditorSession<B: EditorBackend> {
    backend: Arc<B>,
    pages: PageModel,
    page: Page,
    params: ParameterState,
    render: RenderPipeline,
    autosave: EdgeScheduler,
    saved_flash: EdgeScheduler,
    save_indicator: SaveIndicator,
    drag: Option<DragOrigin>,
    commands: mpsc::UnboundedReceiver<EditorCommand>,
    completions_tx: mpsc::UnboundedSender<RenderCompletion>,
    completions_rx: mpsc::UnboundedReceiver<RenderCompletion>,
    view: watch::Sender<EditorView>,
}

impl<B: EditorBackend> EditorSession<B> {
    /// Fetch the catalog, open the start page and issue its first render.
    ///
    /// The catalog is the only hard requirement; everything after this point
    /// degrades instead of failing.
    pub async fn start(
        backend: Arc<B>,
        anchor: &str,
        timings: SessionTimings,
        start: StartPage,
    ) -> Result<(Self, EditorHandle)> {
        let catalog = backend
            .characters()
            .await
            .context("Failed to fetch character catalog")?;
        let pages = PageModel::new(anchor, catalog);
        info!(characters = pages.catalog().len(), pages = pages.total_pages(), anchor = %pages.anchor(), "Editor session starting");

        let start_index = match start {
            StartPage::Index(index) => index,
            StartPage::Character { character, side } => pages
                .find(&character, side)
                .ok_or_else(|| anyhow!("Unknown character '{}'", character))?,
        };

        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (view, view_rx) = watch::channel(EditorView::default());

        let mut session = Self {
            backend,
            page: pages.page(start_index),
            pages,
            params: ParameterState::new(),
            render: RenderPipeline::new(timings.render_throttle),
            autosave: EdgeScheduler::debounce(timings.autosave_delay),
            saved_flash: EdgeScheduler::debounce(timings.saved_flash),
            save_indicator: SaveIndicator::Idle,
            drag: None,
            commands,
            completions_tx,
            completions_rx,
            view,
        };
        session.load_page().await;
        session.publish();

        let handle = EditorHandle {
            commands: commands_tx,
            view: view_rx,
        };
        Ok((session, handle))
    }

    /// Process events until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        loop {
            let render_deadline = self.render.deadline();
            let autosave_deadline = self.autosave.deadline();
            let flash_deadline = self.saved_flash.deadline();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(EditorCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                Some(completion) = self.completions_rx.recv() => {
                    self.render.complete(completion);
                }
                _ = sleep_until_deadline(render_deadline) => {
                    if self.render.expire(Instant::now()) {
                        self.issue_render();
                    }
                }
                _ = sleep_until_deadline(autosave_deadline) => {
                    if self.autosave.expire(Instant::now()) {
                        debug!("Autosave firing");
                        self.save().await;
                    }
                }
                _ = sleep_until_deadline(flash_deadline) => {
                    if self.saved_flash.expire(Instant::now()) {
                        self.save_indicator = SaveIndicator::Idle;
                    }
                }
            }
            self.publish();
        }

        self.shutdown().await;
        self.publish();
    }

    async fn handle_command(&mut self, command: EditorCommand) {
        match command {
            EditorCommand::PointerDown { x, y, button } => self.pointer_down(x, y, button),
            EditorCommand::PointerMove { x, y, geometry } => self.pointer_move(x, y, &geometry),
            EditorCommand::PointerUp => self.pointer_up(),
            EditorCommand::Wheel(direction) => {
                self.adjust_scale(direction.sign() * scale::WHEEL_STEP);
            }
            EditorCommand::NudgeScale(direction) => {
                self.adjust_scale(direction.sign() * scale::FINE_STEP);
            }
            EditorCommand::SetMirror(on) => self.edit_and_schedule(ParamEdit::Mirror(on)),
            EditorCommand::SetUseOtherSide(on) => self.edit_and_schedule(ParamEdit::UseOtherSide(on)),
            EditorCommand::NextPage => self.navigate(self.page.index + 1).await,
            EditorCommand::PrevPage => self.navigate(self.page.index - 1).await,
            EditorCommand::GoToPage(index) => self.navigate(index).await,
            EditorCommand::GoToCharacter { character, side } => match self.pages.find(&character, side) {
                Some(index) => self.navigate(index).await,
                None => warn!(character = %character, side = %side, "No page for character"),
            },
            EditorCommand::Save => self.save().await,
            EditorCommand::Reset => self.reset().await,
            EditorCommand::Shutdown => {}
        }
    }

    // --- interaction -------------------------------------------------------

    fn pointer_down(&mut self, x: f32, y: f32, button: PointerButton) {
        if button != PointerButton::Primary {
            return;
        }
        let working = self.params.working();
        self.drag = Some(DragOrigin {
            x,
            y,
            offset_x: working.offset_x,
            raise: working.raise,
        });
    }

    /// Mid-drag moves render but never schedule an autosave
    fn pointer_move(&mut self, x: f32, y: f32, geometry: &PreviewGeometry) {
        let Some(origin) = self.drag else {
            return;
        };
        let Some((offset_x, raise)) = drag_offsets(&origin, x, y, geometry) else {
            return;
        };
        self.params.mutate(ParamEdit::OffsetX(offset_x));
        self.params.mutate(ParamEdit::Raise(raise));
        self.request_render();
    }

    fn pointer_up(&mut self) {
        if self.drag.take().is_some() && self.params.is_dirty() {
            self.schedule_autosave();
        }
    }

    fn adjust_scale(&mut self, delta: f64) {
        let next = step_scale(self.params.working().scale, delta);
        self.edit_and_schedule(ParamEdit::Scale(next));
    }

    fn edit_and_schedule(&mut self, edit: ParamEdit) {
        self.params.mutate(edit);
        self.request_render();
        self.schedule_autosave();
    }

    // --- rendering ---------------------------------------------------------

    fn request_render(&mut self) {
        if self.render.request(Instant::now()) {
            self.issue_render();
        }
    }

    /// Send a render for the values current right now
    fn issue_render(&mut self) {
        let request = RenderRequest {
            character: self.page.character.clone(),
            side: self.page.side,
            params: *self.params.working(),
        };
        let seq = self.render.begin();
        debug!(seq, character = %request.character, side = %request.side, params = ?request.params, "Issuing render");
        spawn_render(Arc::clone(&self.backend), seq, request, self.completions_tx.clone());
    }

    // --- commit / save / reset --------------------------------------------

    fn schedule_autosave(&mut self) {
        self.autosave.trigger(Instant::now());
    }

    fn current_values(&self) -> PageValues {
        PageValues {
            character: self.page.character.clone(),
            side: self.page.side,
            params: *self.params.working(),
        }
    }

    /// Stage the working values. Unless `force` is set, a clean page is not
    /// sent. Failures are logged only.
    async fn commit(&mut self, force: bool) -> bool {
        if !force && !self.params.is_dirty() {
            return true;
        }
        let values = self.current_values();
        match self.backend.commit(&values).await {
            Ok(()) => {
                debug!(character = %values.character, side = %values.side, "Committed working values");
                true
            }
            Err(err) => {
                warn!(character = %values.character, side = %values.side, error = ?err, "Commit failed");
                false
            }
        }
    }

    /// Commit the current page whether or not it was edited, then flush
    /// every staged page
    async fn save(&mut self) {
        self.autosave.cancel();
        let committed = self.commit(true).await;
        match self.backend.save().await {
            Ok(outcome) if outcome.ok && !committed => {
                warn!(message = ?outcome.message, "Flushed staged pages, but this page was not staged; keeping it dirty");
            }
            Ok(outcome) if outcome.ok => {
                info!(message = ?outcome.message, "Saved staged changes");
                self.params.mark_clean();
                self.save_indicator = SaveIndicator::Saved;
                self.saved_flash.trigger(Instant::now());
            }
            Ok(outcome) => {
                warn!(message = ?outcome.message, "Save rejected by server");
            }
            Err(err) => {
                warn!(error = ?err, "Save failed");
            }
        }
    }

    /// Drop staged edits server-side and reload this page's baseline
    async fn reset(&mut self) {
        self.autosave.cancel();
        self.drag = None;
        if let Err(err) = self.backend.reset().await {
            warn!(error = ?err, "Reset failed");
        }
        self.params.mark_clean();
        info!(character = %self.page.character, side = %self.page.side, "Reset staged changes");
        self.load_page().await;
    }

    // --- navigation --------------------------------------------------------

    /// Commit the outgoing page, then load the incoming one, strictly in order
    async fn navigate(&mut self, index: i64) {
        self.commit(false).await;
        self.drag = None;
        self.page = self.pages.page(index);
        info!(
            page = self.page.index,
            total = self.pages.total_pages(),
            character = %self.page.character,
            side = %self.page.side,
            "Navigated"
        );
        self.load_page().await;
    }

    async fn load_page(&mut self) {
        let baseline = match self.backend.page(&self.page.character, self.page.side).await {
            Ok(baseline) => baseline,
            Err(err) => {
                warn!(character = %self.page.character, side = %self.page.side, error = ?err, "Page load failed, using defaults");
                PageBaseline::default()
            }
        };
        self.params.load(baseline);
        self.request_render();
    }

    async fn shutdown(&mut self) {
        // A drag in progress counts as released
        self.pointer_up();
        if self.autosave.is_pending() {
            info!("Flushing pending autosave before exit");
            self.save().await;
        }
        info!("Editor session stopped");
    }

    fn snapshot(&self) -> EditorView {
        EditorView {
            page: Some(self.page.clone()),
            total_pages: self.pages.total_pages(),
            params: *self.params.working(),
            dirty: self.params.is_dirty(),
            loading: self.render.is_loading(),
            save_indicator: self.save_indicator,
            preview: self.render.displayed().cloned(),
            renders_issued: self.render.issued(),
        }
    }

    fn publish(&self) {
        self.view.send_replace(self.snapshot());
    }
}
