//! Minimal style resolution for captured elements.
//!
//! Only the handful of properties the block renderer understands are resolved:
//! box sizes, uniform padding/margin/border, colors and `display: none`.
//! Rules from `<style>` elements apply in source order (no specificity), and
//! inline `style` attributes win over them.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// An 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS color: hex forms, `rgb()`/`rgba()`, `transparent` and a few names.
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_ascii_lowercase();
        if let Some(hex) = v.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(args) = v.strip_prefix("rgba(").or_else(|| v.strip_prefix("rgb(")) {
            return parse_rgb_args(args.strip_suffix(')')?);
        }
        let named = match v.as_str() {
            "transparent" => Rgba::TRANSPARENT,
            "black" => Rgba::BLACK,
            "white" => Rgba::WHITE,
            "red" => Rgba::rgb(255, 0, 0),
            "green" => Rgba::rgb(0, 128, 0),
            "lime" => Rgba::rgb(0, 255, 0),
            "blue" => Rgba::rgb(0, 0, 255),
            "yellow" => Rgba::rgb(255, 255, 0),
            "orange" => Rgba::rgb(255, 165, 0),
            "purple" => Rgba::rgb(128, 0, 128),
            "gray" | "grey" => Rgba::rgb(128, 128, 128),
            "silver" => Rgba::rgb(192, 192, 192),
            _ => return None,
        };
        Some(named)
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Rgba::parse(&value).ok_or_else(|| format!("unrecognized color `{}`", value))
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_hex()
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok().map(|n| n * 17);
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Rgba::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Rgba> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| s.parse::<f32>().ok().map(|n| n.clamp(0.0, 255.0).round() as u8);
    let alpha = match parts.get(3) {
        Some(a) => (a.parse::<f32>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
        None => 255,
    };
    Some(Rgba::rgba(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, alpha))
}

/// Parse `12px`, `12` or `1.5em` (16px per em) into whole pixels.
pub fn parse_length(value: &str) -> Option<u32> {
    let v = value.trim().to_ascii_lowercase();
    let (num, factor) = if let Some(n) = v.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = v.strip_suffix("em") {
        (n, 16.0)
    } else {
        (v.as_str(), 1.0)
    };
    let n: f32 = num.trim().parse().ok()?;
    if n < 0.0 {
        return None;
    }
    Some((n * factor).round() as u32)
}

/// Resolved style of one element
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub padding: u32,
    pub margin: u32,
    pub border_width: u32,
    pub border_color: Rgba,
    pub background: Rgba,
    pub color: Rgba,
    pub display_none: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            padding: 0,
            margin: 0,
            border_width: 0,
            border_color: Rgba::BLACK,
            background: Rgba::TRANSPARENT,
            color: Rgba::BLACK,
            display_none: false,
        }
    }
}

impl ComputedStyle {
    /// Start a child style: only `color` is inherited.
    pub fn inherit(parent: &ComputedStyle) -> Self {
        Self {
            color: parent.color,
            ..Default::default()
        }
    }

    /// Apply a `prop: value; ...` declaration block. Unknown properties are ignored.
    pub fn apply_declarations(&mut self, block: &str) {
        for decl in block.split(';') {
            let Some((prop, value)) = decl.split_once(':') else {
                continue;
            };
            let value = value.trim().trim_end_matches("!important").trim();
            match prop.trim().to_ascii_lowercase().as_str() {
                "width" => self.width = parse_length(value),
                "height" => self.height = parse_length(value),
                "padding" => self.padding = first_length(value).unwrap_or(self.padding),
                "margin" => self.margin = first_length(value).unwrap_or(self.margin),
                "border-width" => self.border_width = first_length(value).unwrap_or(self.border_width),
                "border-color" => {
                    if let Some(c) = Rgba::parse(value) {
                        self.border_color = c;
                    }
                }
                "border" => self.apply_border(value),
                "background" | "background-color" => {
                    let color = Rgba::parse(value).or_else(|| value.split_whitespace().find_map(Rgba::parse));
                    if let Some(c) = color {
                        self.background = c;
                    } else if value.eq_ignore_ascii_case("none") {
                        self.background = Rgba::TRANSPARENT;
                    }
                }
                "color" => {
                    if let Some(c) = Rgba::parse(value) {
                        self.color = c;
                    }
                }
                "display" => self.display_none = value.eq_ignore_ascii_case("none"),
                _ => {}
            }
        }
    }

    fn apply_border(&mut self, value: &str) {
        if value.eq_ignore_ascii_case("none") || value == "0" {
            self.border_width = 0;
            return;
        }
        let mut width = None;
        for token in value.split_whitespace() {
            if let Some(w) = parse_length(token) {
                width = Some(w);
            } else if let Some(c) = Rgba::parse(token) {
                self.border_color = c;
            }
        }
        // `border: solid red` is a medium (3px) border.
        self.border_width = width.unwrap_or(3);
    }
}

fn first_length(value: &str) -> Option<u32> {
    value.split_whitespace().next().and_then(parse_length)
}

struct Rule {
    selector: Selector,
    declarations: String,
}

/// Rules collected from the `<style>` elements of a document
#[derive(Default)]
pub struct Stylesheet {
    rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn from_document(document: &Html) -> Self {
        let mut sheet = Stylesheet::default();
        if let Ok(style_sel) = Selector::parse("style") {
            for node in document.select(&style_sel) {
                let text = node.text().collect::<String>();
                if !text.trim().is_empty() {
                    sheet.add_css(&text);
                }
            }
        }
        sheet
    }

    /// Add the flat rules of a CSS text. At-rules and unparsable selectors are skipped.
    pub fn add_css(&mut self, css: &str) {
        let css = strip_comments(css);
        for chunk in css.split('}') {
            let Some((selector, declarations)) = chunk.split_once('{') else {
                continue;
            };
            let selector = selector.trim();
            if selector.is_empty() || selector.starts_with('@') {
                continue;
            }
            match Selector::parse(selector) {
                Ok(selector) => self.rules.push(Rule {
                    selector,
                    declarations: declarations.to_string(),
                }),
                Err(_) => log::debug!("skipping unsupported selector `{}`", selector),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Compute the style of `element` given its parent's computed style.
    pub fn compute(&self, element: &ElementRef, parent: &ComputedStyle) -> ComputedStyle {
        let mut style = ComputedStyle::inherit(parent);
        for rule in &self.rules {
            if rule.selector.matches(element) {
                style.apply_declarations(&rule.declarations);
            }
        }
        if let Some(inline) = element.value().attr("style") {
            style.apply_declarations(inline);
        }
        style
    }
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_color_forms() {
        assert_eq!(Rgba::parse("#fff"), Some(Rgba::WHITE));
        assert_eq!(Rgba::parse("#FF000080"), Some(Rgba::rgba(255, 0, 0, 128)));
        assert_eq!(Rgba::parse("rgb(1, 2, 3)"), Some(Rgba::rgb(1, 2, 3)));
        assert_eq!(Rgba::parse("rgba(0,0,0,0)"), Some(Rgba::TRANSPARENT));
        assert_eq!(Rgba::parse("Blue"), Some(Rgba::rgb(0, 0, 255)));
        assert_eq!(Rgba::parse("#12"), None);
        assert_eq!(Rgba::parse("chartreuse-ish"), None);
    }

    #[test]
    fn color_serde_uses_hex_strings() {
        let c: Rgba = serde_json::from_str("\"#102030\"").unwrap();
        assert_eq!(c, Rgba::rgb(0x10, 0x20, 0x30));
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"#102030\"");
        assert!(serde_json::from_str::<Rgba>("\"nope\"").is_err());
    }

    #[test]
    fn lengths() {
        assert_eq!(parse_length("12px"), Some(12));
        assert_eq!(parse_length("0"), Some(0));
        assert_eq!(parse_length("1.5em"), Some(24));
        assert_eq!(parse_length("50%"), None);
        assert_eq!(parse_length("-1px"), None);
    }

    #[test]
    fn declarations_and_border_shorthand() {
        let mut s = ComputedStyle::default();
        s.apply_declarations("width: 100px; height:50px; background: #00f; border: 2px solid red; padding: 4px 8px");
        assert_eq!(s.width, Some(100));
        assert_eq!(s.height, Some(50));
        assert_eq!(s.background, Rgba::rgb(0, 0, 255));
        assert_eq!(s.border_width, 2);
        assert_eq!(s.border_color, Rgba::rgb(255, 0, 0));
        assert_eq!(s.padding, 4);
    }

    #[test]
    fn stylesheet_then_inline_wins() {
        let html = r#"<html><head><style>
            /* square */
            .sq { width: 40px; height: 40px; background: red; color: white }
            @media print { .sq { display: none } }
        </style></head><body><div class="sq" style="background: #00ff00">x</div></body></html>"#;
        let doc = Html::parse_document(html);
        let sheet = Stylesheet::from_document(&doc);
        assert!(!sheet.is_empty());

        let sel = Selector::parse(".sq").unwrap();
        let el = doc.select(&sel).next().unwrap();
        let style = sheet.compute(&el, &ComputedStyle::default());
        assert_eq!(style.width, Some(40));
        assert_eq!(style.background, Rgba::rgb(0, 255, 0));
        assert_eq!(style.color, Rgba::WHITE);
    }
}
