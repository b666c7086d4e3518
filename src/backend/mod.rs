//! Collaborator interfaces the editor consumes
//!
//! The editor never talks HTTP directly; it sees four services. The real
//! implementation is [`http::HttpBackend`], tests use an in-memory mock.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::types::{PageBaseline, PageValues, RenderRequest, Side};

pub mod http;

pub use http::HttpBackend;

/// Ordered character names, fetched once per session
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn characters(&self) -> Result<Vec<String>>;
}

/// Currently staged values for a page
#[async_trait]
pub trait PageService: Send + Sync {
    async fn page(&self, character: &str, side: Side) -> Result<PageBaseline>;
}

/// Composited preview for a transform; returns the encoded image body
#[async_trait]
pub trait RenderService: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>>;
}

/// Staging area and durable flush
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Stage one page's working values
    async fn commit(&self, values: &PageValues) -> Result<()>;

    /// Flush every staged page to durable configuration
    async fn save(&self) -> Result<SaveOutcome>;

    /// Discard staged edits that were not flushed yet
    async fn reset(&self) -> Result<()>;
}

/// Everything the editor session needs from the outside world
pub trait EditorBackend:
    CatalogService + PageService + RenderService + PersistenceService + 'static
{
}

impl<T> EditorBackend for T where
    T: CatalogService + PageService + RenderService + PersistenceService + 'static
{
}

/// Response to a flush request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveOutcome {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}
