/// Rasterizer: paints a display list onto a `Surface`

use crate::rendering::layout::{coord, CHAR_ADVANCE, LINE_HEIGHT};
use crate::rendering::paint::PaintCommand;
use crate::style::Rgba;
use crate::surface::Surface;
use crate::{Error, Result};

/// Glyphs are solid cells inset by one pixel inside their advance box.
const GLYPH_INSET: u32 = 1;

/// Paint `commands` onto a `width` x `height` surface, every coordinate
/// multiplied by `scale`. A `None` background leaves the surface transparent.
///
/// Fails when the scaled size is over the surface limits.
pub fn rasterize(
    commands: &[PaintCommand],
    width: u32,
    height: u32,
    scale: u32,
    background: Option<Rgba>,
) -> Result<Surface> {
    let scale = scale.max(1);
    let (device_w, device_h) = match (width.checked_mul(scale), height.checked_mul(scale)) {
        (Some(w), Some(h)) => (w, h),
        _ => {
            return Err(Error::RenderError(format!(
                "{}x{} box at scale {} overflows the surface size",
                width, height, scale
            )))
        }
    };
    let mut surface = Surface::try_new(device_w, device_h, background.unwrap_or(Rgba::TRANSPARENT))?;
    let s = coord(scale);

    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect {
                x,
                y,
                width,
                height,
                rgba,
            } => surface.fill_rect(
                x.saturating_mul(s),
                y.saturating_mul(s),
                width.saturating_mul(scale),
                height.saturating_mul(scale),
                *rgba,
            ),
            PaintCommand::Text { x, y, text, rgba } => {
                let glyph_w = CHAR_ADVANCE - 2 * GLYPH_INSET;
                let glyph_h = LINE_HEIGHT - 2 * GLYPH_INSET;
                for (i, ch) in text.chars().enumerate() {
                    if ch.is_whitespace() {
                        continue;
                    }
                    let advance = u32::try_from(i).unwrap_or(u32::MAX).saturating_mul(CHAR_ADVANCE);
                    let gx = x.saturating_add(coord(advance.saturating_add(GLYPH_INSET)));
                    let gy = y.saturating_add(coord(GLYPH_INSET));
                    surface.fill_rect(
                        gx.saturating_mul(s),
                        gy.saturating_mul(s),
                        glyph_w.saturating_mul(scale),
                        glyph_h.saturating_mul(scale),
                        *rgba,
                    );
                }
            }
        }
    }

    Ok(surface)
}
