//! In-memory RGBA surfaces produced by a capture

use crate::data_url;
use crate::rendering::check_surface_size;
use crate::style::Rgba;
use crate::{Error, Result};
use sha2::{Digest, Sha256};

/// A rendered bitmap: tightly packed, non-premultiplied RGBA8 rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    /// Create a surface filled with `background`.
    ///
    /// # Panics
    ///
    /// Panics when the size is over the surface limits; use [`Surface::try_new`]
    /// for sizes that come from page content.
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        match Self::try_new(width, height, background) {
            Ok(surface) => surface,
            Err(e) => panic!("{}", e),
        }
    }

    /// Create a surface filled with `background`, failing when the size is
    /// over [`MAX_SURFACE_DIMENSION`](crate::rendering::MAX_SURFACE_DIMENSION)
    /// or [`MAX_SURFACE_AREA`](crate::rendering::MAX_SURFACE_AREA).
    pub fn try_new(width: u32, height: u32, background: Rgba) -> Result<Self> {
        check_surface_size(width, height)?;
        let len = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(len * 4);
        for _ in 0..len {
            pixels.extend_from_slice(&[background.r, background.g, background.b, background.a]);
        }
        Ok(Self { width, height, pixels })
    }

    /// Wrap raw RGBA8 pixels. Fails when the buffer length does not match.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        check_surface_size(width, height)?;
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::RenderError(format!(
                "pixel buffer has {} bytes, expected {} for {}x{}",
                pixels.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.pixels[i..i + 4];
        Some(Rgba::rgba(p[0], p[1], p[2], p[3]))
    }

    /// Composite `color` over the rectangle, clipped to the surface.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgba) {
        if color.a == 0 {
            return;
        }
        let x0 = x.max(0) as i64;
        let y0 = y.max(0) as i64;
        let x1 = (x as i64 + width as i64).min(self.width as i64);
        let y1 = (y as i64 + height as i64).min(self.height as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                let i = (py as usize * self.width as usize + px as usize) * 4;
                blend_over(&mut self.pixels[i..i + 4], color);
            }
        }
    }

    /// Encode as an 8-bit RGBA PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::EncodeError(format!(
                "cannot encode an empty {}x{} surface",
                self.width, self.height
            )));
        }
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        Ok(out)
    }

    /// The `data:image/png;base64,...` form of this surface.
    pub fn to_data_url(&self) -> Result<String> {
        Ok(data_url::png_data_url(&self.encode_png()?))
    }

    /// Hex SHA-256 of dimensions and pixels, stable across encoders.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_be_bytes());
        hasher.update(self.height.to_be_bytes());
        hasher.update(&self.pixels);
        hex::encode(hasher.finalize())
    }
}

fn blend_over(dst: &mut [u8], src: Rgba) {
    if src.a == 255 {
        dst.copy_from_slice(&[src.r, src.g, src.b, 255]);
        return;
    }
    let sa = src.a as u32;
    let da = dst[3] as u32;
    // out_a = sa + da * (1 - sa), all in 0..=255 fixed point
    let out_a = sa * 255 + da * (255 - sa);
    if out_a == 0 {
        dst.copy_from_slice(&[0, 0, 0, 0]);
        return;
    }
    let channel = |s: u8, d: u8| -> u8 {
        let num = s as u32 * sa * 255 + d as u32 * da * (255 - sa);
        ((num + out_a / 2) / out_a) as u8
    };
    dst[0] = channel(src.r, dst[0]);
    dst[1] = channel(src.g, dst[1]);
    dst[2] = channel(src.b, dst[2]);
    dst[3] = ((out_a + 127) / 255) as u8;
}
