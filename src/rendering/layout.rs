/// Block layout of an element snapshot.
///
/// Every element is a block stacked vertically inside its parent, except
/// unstyled inline tags whose words flow into the surrounding text. Text uses a
/// fixed advance per character and wraps on word boundaries.

use crate::page::{ElementSnapshot, SnapshotNode};
use crate::style::{ComputedStyle, Rgba};

/// Horizontal advance of one character
pub const CHAR_ADVANCE: u32 = 8;
/// Height of one text line
pub const LINE_HEIGHT: u32 = 10;

/// Convert a length to a coordinate, clamping at `i32::MAX`.
pub(crate) fn coord(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "code", "em", "i", "label", "mark", "s", "small", "span", "strong", "sub", "sup", "u",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

/// A border box plus the edges around its content
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    pub fn content_width(&self) -> u32 {
        let inner = self.box_model.border.saturating_add(self.box_model.padding).saturating_mul(2);
        self.rect.width.saturating_sub(inner)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutNode {
    /// A block's border box with the colors it paints
    Block {
        lb: LayoutBox,
        background: Rgba,
        border_color: Rgba,
    },
    /// One word of text at its baseline-less top-left position
    Text { x: i32, y: i32, text: String, color: Rgba },
}

enum InlineItem {
    Word(String, Rgba),
    Break,
}

/// Lay out `root` at the origin with `available_width` as its containing width.
///
/// The root's own margin is ignored so its border box starts at (0, 0).
/// Nodes come back in paint order: a block precedes its contents.
pub fn layout_element(root: &ElementSnapshot, available_width: u32) -> Vec<LayoutNode> {
    let mut nodes = Vec::new();
    layout_block(root, 0, 0, available_width, true, &mut nodes);
    nodes
}

/// Lay out one block and its descendants, returning the vertical space used
/// including margins. Sizes saturate instead of overflowing; the renderer
/// rejects the result when it is over the surface limits.
fn layout_block(
    el: &ElementSnapshot,
    x: i32,
    y: i32,
    available_width: u32,
    is_root: bool,
    nodes: &mut Vec<LayoutNode>,
) -> u32 {
    let style = &el.style;
    let margin = if is_root { 0 } else { style.margin };
    let edges = style.border_width.saturating_add(style.padding);
    let both_edges = edges.saturating_mul(2);

    let bx = x.saturating_add(coord(margin));
    let by = y.saturating_add(coord(margin));
    let width = match style.width {
        Some(w) => w.saturating_add(both_edges),
        None => available_width.saturating_sub(margin.saturating_mul(2)),
    };

    let idx = nodes.len();
    nodes.push(LayoutNode::Block {
        lb: LayoutBox {
            rect: Rect { x: bx, y: by, width, height: 0 },
            box_model: BoxModel {
                margin,
                border: style.border_width,
                padding: style.padding,
            },
        },
        background: style.background,
        border_color: style.border_color,
    });

    let content_x = bx.saturating_add(coord(edges));
    let content_top = by.saturating_add(coord(edges));
    let content_width = width.saturating_sub(both_edges);
    let mut cursor_y = content_top;
    let mut pending = Vec::new();

    for child in &el.children {
        match child {
            SnapshotNode::Text(t) => push_words(t, style.color, &mut pending),
            SnapshotNode::Element(c) if c.tag == "br" => pending.push(InlineItem::Break),
            SnapshotNode::Element(c) if is_inline(c) => collect_inline(c, &mut pending),
            SnapshotNode::Element(c) => {
                cursor_y = cursor_y.saturating_add(coord(flow_text(&pending, content_x, cursor_y, content_width, nodes)));
                pending.clear();
                let used = layout_block(c, content_x, cursor_y, content_width, false, nodes);
                cursor_y = cursor_y.saturating_add(coord(used));
            }
        }
    }
    cursor_y = cursor_y.saturating_add(coord(flow_text(&pending, content_x, cursor_y, content_width, nodes)));

    let content_height = u32::try_from(cursor_y.saturating_sub(content_top)).unwrap_or(0);
    let height = style.height.unwrap_or(content_height).saturating_add(both_edges);
    if let LayoutNode::Block { lb, .. } = &mut nodes[idx] {
        lb.rect.height = height;
    }

    height.saturating_add(margin.saturating_mul(2))
}

fn is_inline(el: &ElementSnapshot) -> bool {
    let s: &ComputedStyle = &el.style;
    INLINE_TAGS.contains(&el.tag.as_str())
        && s.width.is_none()
        && s.height.is_none()
        && s.background.a == 0
        && s.border_width == 0
}

fn push_words(text: &str, color: Rgba, out: &mut Vec<InlineItem>) {
    for word in text.split_whitespace() {
        out.push(InlineItem::Word(word.to_string(), color));
    }
}

fn collect_inline(el: &ElementSnapshot, out: &mut Vec<InlineItem>) {
    for child in &el.children {
        match child {
            SnapshotNode::Text(t) => push_words(t, el.style.color, out),
            SnapshotNode::Element(c) if c.tag == "br" => out.push(InlineItem::Break),
            SnapshotNode::Element(c) => collect_inline(c, out),
        }
    }
}

/// Wrap inline items into lines, emitting one text node per word.
/// Returns the height of the produced lines.
fn flow_text(items: &[InlineItem], x: i32, y: i32, width: u32, nodes: &mut Vec<LayoutNode>) -> u32 {
    if items.is_empty() {
        return 0;
    }
    let chars_per_line = (width / CHAR_ADVANCE).max(1) as usize;
    let mut line = 0u32;
    let mut col = 0usize;

    for item in items {
        match item {
            InlineItem::Break => {
                line = line.saturating_add(1);
                col = 0;
            }
            InlineItem::Word(word, color) => {
                let len = word.chars().count();
                if col > 0 && col + 1 + len > chars_per_line {
                    line = line.saturating_add(1);
                    col = 0;
                }
                if col > 0 {
                    col += 1;
                }
                let advance = u32::try_from(col).unwrap_or(u32::MAX).saturating_mul(CHAR_ADVANCE);
                nodes.push(LayoutNode::Text {
                    x: x.saturating_add(coord(advance)),
                    y: y.saturating_add(coord(line.saturating_mul(LINE_HEIGHT))),
                    text: word.clone(),
                    color: *color,
                });
                col += len;
            }
        }
    }

    line.saturating_add(1).saturating_mul(LINE_HEIGHT)
}
