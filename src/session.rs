//! A page session wiring capture and export together.
//!
//! Loading a session disables the download control, starts the capture and
//! registers the export click handler. Once the render completes the surface
//! is attached and stored, and the control is enabled.

use crate::capture::{complete_capture, start_capture, PendingCapture, SurfaceSlot};
use crate::export::{export_handler, Download};
use crate::page::Page;
use crate::rendering::Renderer;
use crate::{CaptureConfig, Error, Result};
use std::sync::Arc;

pub struct Session {
    page: Page,
    config: CaptureConfig,
    slot: SurfaceSlot,
    pending: Option<PendingCapture>,
}

impl Session {
    /// Parse `html` and run the page-ready steps.
    pub fn load(html: &str, config: CaptureConfig, renderer: Arc<dyn Renderer>) -> Result<Self> {
        config.validate()?;
        let mut page = Page::parse(html);
        let slot = SurfaceSlot::new();

        page.control_mut(&config.trigger_selector)?.set_disabled(true);
        page.on_click(
            &config.trigger_selector,
            export_handler(slot.clone(), config.filename.clone()),
        )?;

        let pending = start_capture(&page, &config.source_selector, renderer, config.render_options())?;
        log::info!(
            "session loaded \"{}\": capturing `{}`, download via `{}`",
            page.title(),
            config.source_selector,
            config.trigger_selector
        );

        Ok(Self {
            page,
            config,
            slot,
            pending: Some(pending),
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn slot(&self) -> &SurfaceSlot {
        &self.slot
    }

    /// Whether the capture has completed successfully
    pub fn is_ready(&self) -> bool {
        self.slot.is_ready()
    }

    /// Wait for the capture to complete and apply it.
    ///
    /// Calling this again after completion returns the stored outcome.
    pub async fn settle(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(pending) => {
                let outcome = pending.wait().await;
                self.finish(outcome)
            }
            None => self.slot.surface().map(|_| ()),
        }
    }

    /// Apply the capture if the render has finished, without waiting.
    /// Returns `Ok(true)` once the surface is in place.
    pub fn poll(&mut self) -> Result<bool> {
        let outcome = match self.pending.as_mut() {
            Some(pending) => match pending.try_poll() {
                Some(outcome) => outcome,
                None => return Ok(false),
            },
            None => return self.slot.surface().map(|_| true),
        };
        self.pending = None;
        self.finish(outcome).map(|_| true)
    }

    fn finish(&mut self, outcome: Result<crate::Surface>) -> Result<()> {
        complete_capture(&mut self.page, &self.slot, outcome, self.config.attach_surface)?;
        self.page.control_mut(&self.config.trigger_selector)?.set_disabled(false);
        Ok(())
    }

    /// Dispatch a click to any element of the page.
    pub fn click(&mut self, selector: &str) -> Result<()> {
        self.page.click(selector)
    }

    /// Click the download control and read back the attributes it was given.
    pub fn click_download(&mut self) -> Result<Download> {
        let trigger = self.config.trigger_selector.clone();
        self.page.click(&trigger)?;
        let control = self
            .page
            .control(&trigger)
            .ok_or_else(|| Error::ElementNotFound(trigger.clone()))?;
        match (control.attr("download"), control.attr("href")) {
            (Some(filename), Some(href)) => Ok(Download {
                filename: filename.to_string(),
                href: href.to_string(),
            }),
            _ => Err(Error::Other(format!("`{}` has no download link after click", trigger))),
        }
    }
}
