//! In-memory editor server for tests
//!
//! Behaves like the real server: commits land in a staging map, save moves
//! staged values into the durable map, reset drops the staging map. Every call
//! is recorded with the (paused) tokio clock so tests can assert ordering.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::backend::{CatalogService, PageService, PersistenceService, RenderService, SaveOutcome};
use crate::types::{PageBaseline, PageValues, ParameterSet, RenderRequest, Side};

pub const PREVIEW_WIDTH: u32 = 16;
pub const PREVIEW_HEIGHT: u32 = 9;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Characters,
    Page { character: String, side: Side },
    Render(RenderRequest),
    Commit(PageValues),
    Save,
    Reset,
}

type PageKey = (String, Side);

pub struct MockBackend {
    catalog: Vec<String>,
    png: Vec<u8>,
    calls: Mutex<Vec<(Instant, Call)>>,
    staged: Mutex<HashMap<PageKey, ParameterSet>>,
    durable: Mutex<HashMap<PageKey, ParameterSet>>,
    render_delays: Mutex<VecDeque<Duration>>,
    commit_delay: Mutex<Duration>,
    pub fail_catalog: AtomicBool,
    pub fail_renders: AtomicBool,
    pub fail_commits: AtomicBool,
    pub fail_saves: AtomicBool,
    pub reject_saves: AtomicBool,
}

impl MockBackend {
    pub fn new(catalog: &[&str]) -> Self {
        let mut png = Vec::new();
        image::RgbaImage::new(PREVIEW_WIDTH, PREVIEW_HEIGHT)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode test preview");
        Self {
            catalog: catalog.iter().map(|s| s.to_string()).collect(),
            png,
            calls: Mutex::new(Vec::new()),
            staged: Mutex::new(HashMap::new()),
            durable: Mutex::new(HashMap::new()),
            render_delays: Mutex::new(VecDeque::new()),
            commit_delay: Mutex::new(Duration::ZERO),
            fail_catalog: AtomicBool::new(false),
            fail_renders: AtomicBool::new(false),
            fail_commits: AtomicBool::new(false),
            fail_saves: AtomicBool::new(false),
            reject_saves: AtomicBool::new(false),
        }
    }

    /// Seed a durable value, as if it was already in the config file
    pub fn with_durable(self, character: &str, side: Side, params: ParameterSet) -> Self {
        self.durable.lock().unwrap().insert((character.to_string(), side), params);
        self
    }

    /// Delays applied to the next renders, in call order
    pub fn queue_render_delays(&self, delays: &[Duration]) {
        self.render_delays.lock().unwrap().extend(delays.iter().copied());
    }

    pub fn set_commit_delay(&self, delay: Duration) {
        *self.commit_delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|(_, c)| pred(c)).count()
    }

    pub fn renders(&self) -> Vec<RenderRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Render(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn durable(&self, character: &str, side: Side) -> Option<ParameterSet> {
        self.durable.lock().unwrap().get(&(character.to_string(), side)).copied()
    }

    pub fn staged(&self, character: &str, side: Side) -> Option<ParameterSet> {
        self.staged.lock().unwrap().get(&(character.to_string(), side)).copied()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }
}

#[async_trait]
impl CatalogService for MockBackend {
    async fn characters(&self) -> Result<Vec<String>> {
        self.record(Call::Characters);
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(anyhow!("catalog unavailable"));
        }
        Ok(self.catalog.clone())
    }
}

#[async_trait]
impl PageService for MockBackend {
    async fn page(&self, character: &str, side: Side) -> Result<PageBaseline> {
        self.record(Call::Page {
            character: character.to_string(),
            side,
        });
        let key = (character.to_string(), side);
        if let Some(params) = self.staged.lock().unwrap().get(&key) {
            return Ok(PageBaseline { params: *params, dirty: true });
        }
        let params = self.durable.lock().unwrap().get(&key).copied().unwrap_or_default();
        Ok(PageBaseline { params, dirty: false })
    }
}

#[async_trait]
impl RenderService for MockBackend {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>> {
        self.record(Call::Render(request.clone()));
        let delay = self.render_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_renders.load(Ordering::SeqCst) {
            return Err(anyhow!("render exploded"));
        }
        Ok(self.png.clone())
    }
}

#[async_trait]
impl PersistenceService for MockBackend {
    async fn commit(&self, values: &PageValues) -> Result<()> {
        self.record(Call::Commit(values.clone()));
        let delay = *self.commit_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(anyhow!("commit refused"));
        }
        self.staged
            .lock()
            .unwrap()
            .insert((values.character.clone(), values.side), values.params);
        Ok(())
    }

    async fn save(&self) -> Result<SaveOutcome> {
        self.record(Call::Save);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(anyhow!("disk full"));
        }
        if self.reject_saves.load(Ordering::SeqCst) {
            return Ok(SaveOutcome {
                ok: false,
                message: Some("read-only".to_string()),
            });
        }
        let staged: Vec<_> = self.staged.lock().unwrap().drain().collect();
        self.durable.lock().unwrap().extend(staged);
        Ok(SaveOutcome {
            ok: true,
            message: Some("Saved".to_string()),
        })
    }

    async fn reset(&self) -> Result<()> {
        self.record(Call::Reset);
        self.staged.lock().unwrap().clear();
        Ok(())
    }
}
