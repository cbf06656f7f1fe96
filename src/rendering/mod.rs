//! Rendering collaborator: turns an element snapshot into a `Surface`.

pub mod layout;
pub mod paint;
pub mod raster;

use crate::page::ElementSnapshot;
use crate::style::Rgba;
use crate::surface::Surface;
use crate::{Error, Result, Viewport};

/// Largest width or height of a produced surface, in device pixels
pub const MAX_SURFACE_DIMENSION: u32 = 16_384;
/// Largest pixel count of a produced surface
pub const MAX_SURFACE_AREA: u64 = 16_384 * 8_192;
/// Largest accepted device pixel ratio
pub const MAX_SCALE: u32 = 16;

/// Reject surface sizes beyond [`MAX_SURFACE_DIMENSION`] or [`MAX_SURFACE_AREA`].
pub fn check_surface_size(width: u32, height: u32) -> Result<()> {
    let area = width as u64 * height as u64;
    if width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION || area > MAX_SURFACE_AREA {
        return Err(Error::RenderError(format!(
            "{}x{} surface exceeds the {}px / {} pixel limit",
            width, height, MAX_SURFACE_DIMENSION, MAX_SURFACE_AREA
        )));
    }
    Ok(())
}

/// Options passed to a renderer for one capture
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Containing block for the captured element
    pub viewport: Viewport,
    /// Device pixel ratio applied to the produced surface
    pub scale: u32,
    /// Clear color of the surface; `None` keeps it transparent
    pub background: Option<Rgba>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            scale: 1,
            background: Some(Rgba::WHITE),
        }
    }
}

/// Converts an element into a bitmap surface.
///
/// Implementations run on a capture worker thread, hence `Send + Sync`.
pub trait Renderer: Send + Sync {
    fn render(&self, element: &ElementSnapshot, options: &RenderOptions) -> Result<Surface>;
}

/// The built-in block renderer (layout, paint, raster).
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxRenderer;

impl Renderer for BoxRenderer {
    fn render(&self, element: &ElementSnapshot, options: &RenderOptions) -> Result<Surface> {
        let nodes = layout::layout_element(element, options.viewport.width);
        let (width, height) = match nodes.first() {
            Some(layout::LayoutNode::Block { lb, .. }) => (lb.rect.width, lb.rect.height),
            _ => (0, 0),
        };
        if width == 0 || height == 0 {
            return Err(Error::RenderError(format!(
                "<{}> has an empty {}x{} box",
                element.tag, width, height
            )));
        }

        let commands = paint::build_display_list(&nodes);
        log::debug!(
            "painting <{}> at {}x{} (scale {}) with {} commands",
            element.tag,
            width,
            height,
            options.scale,
            commands.len()
        );
        raster::rasterize(&commands, width, height, options.scale, options.background)
    }
}

impl<F> Renderer for F
where
    F: Fn(&ElementSnapshot, &RenderOptions) -> Result<Surface> + Send + Sync,
{
    fn render(&self, element: &ElementSnapshot, options: &RenderOptions) -> Result<Surface> {
        self(element, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;

    #[test]
    fn box_renderer_sizes_surface_to_the_element() {
        let page = Page::parse(r#"<div class="sq" style="width:30px;height:20px;background:#00f">hi</div>"#);
        let snap = page.snapshot(".sq").unwrap();
        let surface = BoxRenderer.render(&snap, &RenderOptions::default()).unwrap();
        assert_eq!((surface.width(), surface.height()), (30, 20));
        assert_eq!(surface.pixel(29, 19), Some(Rgba::rgb(0, 0, 255)));
        assert_eq!(surface.pixel(1, 1), Some(Rgba::BLACK));
    }

    #[test]
    fn empty_element_is_a_render_error() {
        let page = Page::parse(r#"<div class="sq"></div>"#);
        let snap = page.snapshot(".sq").unwrap();
        let err = BoxRenderer.render(&snap, &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, Error::RenderError(_)));
    }

    #[test]
    fn oversized_element_is_a_render_error() {
        let page = Page::parse(r#"<div class="sq" style="width:1e10px;height:1e10px;border:1e10px solid red"></div>"#);
        let snap = page.snapshot(".sq").unwrap();
        match BoxRenderer.render(&snap, &RenderOptions::default()) {
            Err(Error::RenderError(msg)) => assert!(msg.contains("exceeds"), "got {}", msg),
            other => panic!("unexpected {:?}", other),
        }

        let wide = Page::parse(r#"<div class="sq" style="width:20000px;height:1px"></div>"#);
        assert!(BoxRenderer.render(&wide.snapshot(".sq").unwrap(), &RenderOptions::default()).is_err());
    }

    #[test]
    fn huge_scale_is_a_render_error() {
        let page = Page::parse(r#"<div class="sq" style="width:10px;height:10px"></div>"#);
        let options = RenderOptions {
            scale: 50_000_000,
            ..Default::default()
        };
        let err = BoxRenderer.render(&page.snapshot(".sq").unwrap(), &options).unwrap_err();
        assert!(matches!(err, Error::RenderError(_)));
    }

    #[test]
    fn surface_size_limits() {
        assert!(check_surface_size(MAX_SURFACE_DIMENSION, 1).is_ok());
        assert!(check_surface_size(MAX_SURFACE_DIMENSION + 1, 1).is_err());
        assert!(check_surface_size(MAX_SURFACE_DIMENSION, MAX_SURFACE_DIMENSION).is_err());
    }

    #[test]
    fn closures_are_renderers() {
        let fixed = |_: &ElementSnapshot, _: &RenderOptions| -> Result<Surface> { Ok(Surface::new(2, 2, Rgba::WHITE)) };
        let page = Page::parse(r#"<div class="sq"></div>"#);
        let s = fixed.render(&page.snapshot(".sq").unwrap(), &RenderOptions::default()).unwrap();
        assert_eq!(s.width(), 2);
    }
}
