//! Preview render pipeline
//!
//! Throttled (leading + trailing) render requests, each tagged with a sequence
//! number. Completions may arrive in any order; only a completion newer than
//! what is on screen replaces it, and a failure just ends that request.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::messages::Preview;
use crate::backend::RenderService;
use crate::scheduler::EdgeScheduler;
use crate::types::RenderRequest;

/// Result of one issued render, sent back to the session loop
#[derive(Debug)]
pub struct RenderCompletion {
    pub seq: u64,
    pub result: Result<Preview>,
}

#[derive(Debug)]
pub struct RenderPipeline {
    throttle: EdgeScheduler,
    next_seq: u64,
    in_flight: usize,
    displayed: Option<Arc<Preview>>,
}

impl RenderPipeline {
    pub fn new(window: Duration) -> Self {
        Self {
            throttle: EdgeScheduler::throttle(window),
            next_seq: 0,
            in_flight: 0,
            displayed: None,
        }
    }

    /// Ask for a render. True means issue one now; otherwise it is folded
    /// into the trailing edge of the open window.
    pub fn request(&mut self, now: Instant) -> bool {
        self.throttle.trigger(now)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    /// Window elapsed. True means a coalesced request must be issued now.
    pub fn expire(&mut self, now: Instant) -> bool {
        self.throttle.expire(now)
    }

    /// Reserve a sequence number for a request about to be sent
    pub fn begin(&mut self) -> u64 {
        self.next_seq += 1;
        self.in_flight += 1;
        self.next_seq
    }

    /// Record a finished request. Returns true if the displayed image changed.
    pub fn complete(&mut self, completion: RenderCompletion) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion.result {
            Ok(preview) => {
                let newer = self
                    .displayed
                    .as_ref()
                    .is_none_or(|shown| preview.seq > shown.seq);
                if newer {
                    debug!(seq = completion.seq, "Displaying render");
                    self.displayed = Some(Arc::new(preview));
                } else {
                    debug!(seq = completion.seq, "Discarding superseded render");
                }
                newer
            }
            Err(err) => {
                warn!(seq = completion.seq, error = ?err, "Render failed, keeping previous image");
                false
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn displayed(&self) -> Option<&Arc<Preview>> {
        self.displayed.as_ref()
    }

    pub fn issued(&self) -> u64 {
        self.next_seq
    }
}

/// Fetch and decode a render off the session loop
pub fn spawn_render<R>(backend: Arc<R>, seq: u64, request: RenderRequest, done: UnboundedSender<RenderCompletion>)
where
    R: RenderService + ?Sized + 'static,
{
    tokio::spawn(async move {
        let result = fetch_preview(backend.as_ref(), seq, request).await;
        // Session gone means nobody is waiting for this image
        let _ = done.send(RenderCompletion { seq, result });
    });
}

async fn fetch_preview<R: RenderService + ?Sized>(backend: &R, seq: u64, request: RenderRequest) -> Result<Preview> {
    let bytes = backend.render(&request).await?;
    let image = image::load_from_memory(&bytes)
        .with_context(|| format!("Failed to decode render for {} ({})", request.character, request.side))?
        .to_rgba8();
    Ok(Preview {
        seq,
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
        request,
    })
}
