//! `data:` URL building, parsing and the forced-download media type rewrite.

use crate::{Error, Result};
use base64::Engine as _;
use std::fmt;

/// Media type attached to encoded surfaces
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// Generic binary type that makes browsers save the payload instead of showing it
pub const OCTET_STREAM_MEDIA_TYPE: &str = "application/octet-stream";

const PNG_PREFIX: &str = "data:image/png";
const OCTET_STREAM_PREFIX: &str = "data:application/octet-stream";

/// Build `data:image/png;base64,...` for already encoded PNG bytes.
pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        PNG_MEDIA_TYPE,
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

/// Rewrite a leading `data:image/png` to `data:application/octet-stream`.
///
/// This is a text substitution on the prefix only; the payload is not touched
/// and URLs with any other prefix come back unchanged.
pub fn force_download(url: &str) -> String {
    match url.strip_prefix(PNG_PREFIX) {
        Some(rest) => format!("{}{}", OCTET_STREAM_PREFIX, rest),
        None => url.to_string(),
    }
}

/// A parsed `data:` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Declared media type (empty when omitted)
    pub media_type: String,
    /// Whether the payload is base64 encoded
    pub base64: bool,
    /// Raw payload text after the comma
    pub data: String,
}

impl DataUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| Error::DataUrlError("missing `data:` scheme".into()))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| Error::DataUrlError("missing `,` before payload".into()))?;

        let mut params = header.split(';');
        let media_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        let base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

        Ok(Self {
            media_type,
            base64,
            data: data.to_string(),
        })
    }

    /// Decode the payload bytes. Only base64 payloads are supported.
    pub fn decode(&self) -> Result<Vec<u8>> {
        if !self.base64 {
            return Err(Error::DataUrlError("payload is not base64 encoded".into()));
        }
        base64::engine::general_purpose::STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| Error::DataUrlError(format!("bad base64 payload: {}", e)))
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{}", self.media_type)?;
        if self.base64 {
            f.write_str(";base64")?;
        }
        write!(f, ",{}", self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_url_has_image_prefix() {
        let url = png_data_url(&[1, 2, 3]);
        assert_eq!(url, "data:image/png;base64,AQID");
    }

    #[test]
    fn force_download_rewrites_only_the_prefix() {
        let url = png_data_url(b"\x89PNG");
        let forced = force_download(&url);
        assert!(forced.starts_with("data:application/octet-stream;base64,"));
        assert!(!forced.starts_with("data:image/png"));
        assert_eq!(
            forced.split_once(',').map(|(_, p)| p),
            url.split_once(',').map(|(_, p)| p)
        );
    }

    #[test]
    fn force_download_leaves_other_urls_alone() {
        let jpeg = "data:image/jpeg;base64,AAAA";
        assert_eq!(force_download(jpeg), jpeg);
        // Anchored: a later occurrence is not a prefix.
        let odd = "https://x/?u=data:image/png";
        assert_eq!(force_download(odd), odd);
    }

    #[test]
    fn parse_and_decode() {
        let url = DataUrl::parse("data:application/octet-stream;base64,AQID").unwrap();
        assert_eq!(url.media_type, OCTET_STREAM_MEDIA_TYPE);
        assert!(url.base64);
        assert_eq!(url.decode().unwrap(), vec![1, 2, 3]);
        assert_eq!(url.to_string(), "data:application/octet-stream;base64,AQID");
    }

    #[test]
    fn parse_rejects_non_data_urls() {
        assert!(DataUrl::parse("http://example.com").is_err());
        assert!(DataUrl::parse("data:image/png;base64").is_err());
        let plain = DataUrl::parse("data:,hello").unwrap();
        assert!(plain.decode().is_err());
    }
}
