//! elemshot
//!
//! Capture an element of an HTML page as a bitmap surface and hand it to the
//! user as a PNG download.
//!
//! # Flow
//!
//! - **Capture**: when a page session loads, the source element is snapshotted
//!   and rendered on a worker thread. When the render completes the surface is
//!   appended to the page body and stored in a [`SurfaceSlot`].
//! - **Export**: clicking the download control encodes the surface as a
//!   `data:image/png;base64,...` URL, rewrites the media type to
//!   `application/octet-stream` so browsers save rather than display it, and
//!   sets the control's `download` and `href` attributes.
//!
//! The download control stays disabled until the capture completes; a click
//! before then fails with [`Error::SurfaceNotReady`].
//!
//! # Example
//!
//! ```no_run
//! use elemshot::{BoxRenderer, CaptureConfig, Session};
//! use std::sync::Arc;
//!
//! # async fn run() -> elemshot::Result<()> {
//! let html = r##"<div class="sq" style="width:64px;height:64px;background:teal"></div>
//!               <a id="download" href="#">Download</a>"##;
//! let mut session = Session::load(html, CaptureConfig::default(), Arc::new(BoxRenderer))?;
//! session.settle().await?;
//! let download = session.click_download()?;
//! assert_eq!(download.filename, "image.png");
//! assert!(download.href.starts_with("data:application/octet-stream;base64,"));
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod capture;
pub mod data_url;
pub mod export;
pub mod page;
pub mod rendering;
pub mod session;
pub mod style;
pub mod surface;

pub use capture::{PendingCapture, SlotState, SurfaceSlot};
pub use export::{Download, DEFAULT_FILENAME};
pub use page::{ElementSnapshot, Page};
pub use rendering::{BoxRenderer, RenderOptions, Renderer};
pub use session::Session;
pub use style::Rgba;
pub use surface::Surface;

/// Configuration of a capture session
///
/// Defaults match a page with a `.sq` element to capture and an `#download`
/// anchor, producing `image.png`. Every field may be omitted when loading
/// from JSON.
///
/// # Examples
///
/// ```
/// let cfg = elemshot::CaptureConfig::default();
/// assert_eq!(cfg.filename, "image.png");
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Selector of the element to capture
    pub source_selector: String,
    /// Selector of the download control
    pub trigger_selector: String,
    /// Filename suggested for the download
    pub filename: String,
    /// Containing block for the captured element
    pub viewport: Viewport,
    /// Device pixel ratio of the produced surface
    pub scale: u32,
    /// Surface clear color; `None` leaves uncovered pixels transparent
    pub background: Option<Rgba>,
    /// Whether the rendered surface is appended to the page body
    pub attach_surface: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source_selector: ".sq".to_string(),
            trigger_selector: "#download".to_string(),
            filename: DEFAULT_FILENAME.to_string(),
            viewport: Viewport::default(),
            scale: 1,
            background: Some(Rgba::WHITE),
            attach_surface: true,
        }
    }
}

impl CaptureConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CaptureConfig =
            serde_json::from_str(json).map_err(|e| Error::ConfigError(format!("bad config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_selector.trim().is_empty() {
            return Err(Error::ConfigError("source_selector is empty".into()));
        }
        if self.trigger_selector.trim().is_empty() {
            return Err(Error::ConfigError("trigger_selector is empty".into()));
        }
        if self.filename.trim().is_empty() {
            return Err(Error::ConfigError("filename is empty".into()));
        }
        if self.scale == 0 || self.scale > rendering::MAX_SCALE {
            return Err(Error::ConfigError(format!(
                "scale {} is outside 1..={}",
                self.scale,
                rendering::MAX_SCALE
            )));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::ConfigError(format!(
                "viewport {}x{} is empty",
                self.viewport.width, self.viewport.height
            )));
        }
        if self.viewport.width > rendering::MAX_SURFACE_DIMENSION || self.viewport.height > rendering::MAX_SURFACE_DIMENSION {
            return Err(Error::ConfigError(format!(
                "viewport {}x{} is larger than {}px",
                self.viewport.width,
                self.viewport.height,
                rendering::MAX_SURFACE_DIMENSION
            )));
        }
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            viewport: self.viewport,
            scale: self.scale,
            background: self.background,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
