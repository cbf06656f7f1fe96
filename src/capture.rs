//! Capture: render the source element on a worker thread and keep the
//! resulting surface in a single-assignment slot.

use crate::page::Page;
use crate::rendering::{RenderOptions, Renderer};
use crate::surface::Surface;
use crate::{Error, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;
use tokio::sync::oneshot;

/// What a slot currently holds
#[derive(Debug, Clone)]
pub enum SlotState {
    /// Capture has not completed yet
    Pending,
    /// Capture completed with this surface
    Ready(Arc<Surface>),
    /// Capture failed; the reason is kept for later readers
    Failed(String),
}

/// Shared holder for the captured surface.
///
/// Written once when the capture completes, read by every export. Clones
/// share the same slot.
#[derive(Debug, Clone)]
pub struct SurfaceSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl Default for SurfaceSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceSlot {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotState::Pending)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> SlotState {
        self.lock().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.lock(), SlotState::Ready(_))
    }

    /// The captured surface, or the reason it is not available.
    pub fn surface(&self) -> Result<Arc<Surface>> {
        match &*self.lock() {
            SlotState::Ready(s) => Ok(s.clone()),
            SlotState::Pending => Err(Error::SurfaceNotReady),
            SlotState::Failed(reason) => Err(Error::CaptureFailed(reason.clone())),
        }
    }

    /// Store the surface. A slot accepts exactly one outcome.
    pub fn fill(&self, surface: Surface) -> Result<Arc<Surface>> {
        let mut state = self.lock();
        if !matches!(*state, SlotState::Pending) {
            return Err(Error::Other("surface slot already resolved".into()));
        }
        let surface = Arc::new(surface);
        *state = SlotState::Ready(surface.clone());
        Ok(surface)
    }

    /// Record a failed capture. Ignored when the slot is already resolved.
    pub fn fail(&self, reason: impl Into<String>) {
        let mut state = self.lock();
        if matches!(*state, SlotState::Pending) {
            *state = SlotState::Failed(reason.into());
        }
    }
}

/// A render in flight on the worker thread
#[derive(Debug)]
pub struct PendingCapture {
    selector: String,
    started: Instant,
    rx: oneshot::Receiver<Result<Surface>>,
}

impl PendingCapture {
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Wait for the renderer to finish.
    pub async fn wait(self) -> Result<Surface> {
        let res = self
            .rx
            .await
            .map_err(|e| Error::RenderError(format!("render worker went away: {}", e)))?;
        log::debug!(
            "render of `{}` finished after {:?}",
            self.selector,
            self.started.elapsed()
        );
        res
    }

    /// Non-blocking check: `None` while the render is still running.
    pub fn try_poll(&mut self) -> Option<Result<Surface>> {
        match self.rx.try_recv() {
            Ok(res) => Some(res),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                Some(Err(Error::RenderError("render worker went away".into())))
            }
        }
    }
}

/// Snapshot the element matching `selector` and render it on a worker thread.
///
/// Lookup errors are returned immediately; render errors arrive through the
/// returned `PendingCapture`. A panicking renderer is reported as a
/// `RenderError` carrying the panic message.
pub fn start_capture(
    page: &Page,
    selector: &str,
    renderer: Arc<dyn Renderer>,
    options: RenderOptions,
) -> Result<PendingCapture> {
    let snapshot = page.snapshot(selector)?;
    let (tx, rx) = oneshot::channel();

    log::debug!("starting capture of `{}` <{}>", selector, snapshot.tag);
    thread::Builder::new()
        .name("elemshot-render".into())
        .spawn(move || {
            let res = panic::catch_unwind(AssertUnwindSafe(|| renderer.render(&snapshot, &options)))
                .unwrap_or_else(|payload| {
                    Err(Error::RenderError(format!(
                        "renderer panicked: {}",
                        panic_message(&*payload)
                    )))
                });
            // Receiver may be gone if the capture was abandoned.
            let _ = tx.send(res);
        })
        .map_err(|e| Error::RenderError(format!("failed to spawn render worker: {}", e)))?;

    Ok(PendingCapture {
        selector: selector.to_string(),
        started: Instant::now(),
        rx,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}

/// Apply a finished render: store it in `slot`, then attach the surface to
/// the page body (when `attach`). Failures are recorded in the slot and
/// returned; an already resolved slot leaves the page untouched.
pub fn complete_capture(page: &mut Page, slot: &SurfaceSlot, outcome: Result<Surface>, attach: bool) -> Result<Arc<Surface>> {
    match outcome {
        Ok(surface) => {
            let surface = slot.fill(surface)?;
            if attach {
                page.append_surface(&surface);
            }
            log::info!(
                "captured {}x{} surface (sha256 {})",
                surface.width(),
                surface.height(),
                &surface.fingerprint()[..12]
            );
            Ok(surface)
        }
        Err(e) => {
            log::warn!("capture failed: {}", e);
            slot.fail(e.to_string());
            Err(e)
        }
    }
}
