//! Export: turn the captured surface into a forced-download link.

use crate::capture::SurfaceSlot;
use crate::data_url::{self, DataUrl};
use crate::page::Control;
use crate::Result;

/// Filename suggested to the browser when none is configured
pub const DEFAULT_FILENAME: &str = "image.png";

/// Attribute values assigned to the download control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Suggested filename (`download` attribute)
    pub filename: String,
    /// `data:application/octet-stream;base64,...` reference (`href` attribute)
    pub href: String,
}

impl Download {
    /// Decode the PNG bytes carried by `href`.
    pub fn payload(&self) -> Result<Vec<u8>> {
        DataUrl::parse(&self.href)?.decode()
    }
}

/// Encode the slot's surface as a PNG data URL with the media type forced to
/// `application/octet-stream`.
pub fn export_download(slot: &SurfaceSlot, filename: &str) -> Result<Download> {
    let surface = match slot.surface() {
        Ok(s) => s,
        Err(e) => {
            log::warn!("export requested before a usable capture: {}", e);
            return Err(e);
        }
    };
    let href = data_url::force_download(&surface.to_data_url()?);
    log::debug!("exported {} as {} bytes of data URL", filename, href.len());
    Ok(Download {
        filename: filename.to_string(),
        href,
    })
}

/// Set `download` and `href` on the control.
pub fn apply_download(control: &mut Control, download: &Download) {
    control.set_attr("download", download.filename.clone());
    control.set_attr("href", download.href.clone());
}

/// Click handler performing the export against `slot`.
pub fn export_handler(slot: SurfaceSlot, filename: String) -> impl Fn(&mut Control) -> Result<()> + Send + Sync + 'static {
    move |control: &mut Control| {
        let download = export_download(&slot, &filename)?;
        apply_download(control, &download);
        Ok(())
    }
}
