/// Paint commands produced from a layout

use crate::rendering::layout::{coord, LayoutNode};
use crate::style::Rgba;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        rgba: Rgba,
    },
}

/// Turn layout nodes into paint commands: background, then border edges, then text.
pub fn build_display_list(nodes: &[LayoutNode]) -> Vec<PaintCommand> {
    let mut commands = Vec::new();
    for node in nodes {
        match node {
            LayoutNode::Block {
                lb,
                background,
                border_color,
            } => {
                let r = &lb.rect;
                if background.a > 0 {
                    commands.push(PaintCommand::SolidRect {
                        x: r.x,
                        y: r.y,
                        width: r.width,
                        height: r.height,
                        rgba: *background,
                    });
                }
                let b = lb.box_model.border;
                if b > 0 && border_color.a > 0 {
                    let bi = coord(b);
                    let inner_h = r.height.saturating_sub(b.saturating_mul(2));
                    let bottom = r.y.saturating_add(coord(r.height)).saturating_sub(bi);
                    let right = r.x.saturating_add(coord(r.width)).saturating_sub(bi);
                    let edges = [
                        (r.x, r.y, r.width, b.min(r.height)),
                        (r.x, bottom, r.width, b.min(r.height)),
                        (r.x, r.y.saturating_add(bi), b.min(r.width), inner_h),
                        (right, r.y.saturating_add(bi), b.min(r.width), inner_h),
                    ];
                    for (x, y, width, height) in edges {
                        commands.push(PaintCommand::SolidRect {
                            x,
                            y,
                            width,
                            height,
                            rgba: *border_color,
                        });
                    }
                }
            }
            LayoutNode::Text { x, y, text, color } => commands.push(PaintCommand::Text {
                x: *x,
                y: *y,
                text: text.clone(),
                rgba: *color,
            }),
        }
    }
    commands
}
