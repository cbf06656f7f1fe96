//! Loaded page model: element lookup, owned element snapshots for the
//! renderer, mutable control attributes with click handlers, and the list of
//! surfaces appended to the body.

use crate::style::{ComputedStyle, Stylesheet};
use crate::surface::Surface;
use crate::{Error, Result};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Handler invoked when a control is clicked; may mutate the control's attributes.
pub type ClickHandler = Arc<dyn Fn(&mut Control) -> Result<()> + Send + Sync>;

/// Element children the renderer never paints
const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "template", "noscript", "title", "meta", "link"];

/// An owned copy of an element subtree with resolved styles.
///
/// Snapshots are detached from the document so they can be handed to a
/// rendering worker on another thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSnapshot {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub style: ComputedStyle,
    pub children: Vec<SnapshotNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotNode {
    Element(ElementSnapshot),
    Text(String),
}

impl ElementSnapshot {
    /// Concatenated text of the subtree, blocks separated by spaces
    pub fn text(&self) -> String {
        let mut parts = Vec::new();
        collect_text(self, &mut parts);
        parts.join(" ")
    }
}

fn collect_text(el: &ElementSnapshot, out: &mut Vec<String>) {
    for child in &el.children {
        match child {
            SnapshotNode::Text(t) => out.push(t.clone()),
            SnapshotNode::Element(e) => collect_text(e, out),
        }
    }
}

/// A clickable element whose attributes can be rewritten in place.
pub struct Control {
    selector: String,
    tag: String,
    attributes: BTreeMap<String, String>,
    handlers: Vec<ClickHandler>,
}

impl Control {
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn is_disabled(&self) -> bool {
        self.attributes.contains_key("disabled")
    }

    /// Toggle `disabled` and `aria-disabled` together.
    pub fn set_disabled(&mut self, disabled: bool) {
        if disabled {
            self.set_attr("disabled", "");
            self.set_attr("aria-disabled", "true");
        } else {
            self.remove_attr("disabled");
            self.remove_attr("aria-disabled");
        }
    }
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("selector", &self.selector)
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// A surface appended to the page body (the `<canvas>` a capture leaves behind)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedSurface {
    pub width: u32,
    pub height: u32,
    pub fingerprint: String,
}

/// A parsed page plus the mutable state layered over it
pub struct Page {
    document: Html,
    stylesheet: Stylesheet,
    controls: HashMap<String, Control>,
    body: Vec<AttachedSurface>,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let stylesheet = Stylesheet::from_document(&document);
        log::debug!("parsed page with {} style rules", stylesheet.len());
        Self {
            document,
            stylesheet,
            controls: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn title(&self) -> String {
        Selector::parse("title")
            .ok()
            .and_then(|sel| self.document.select(&sel).next().map(|n| n.text().collect::<String>()))
            .map(|t| t.trim().to_string())
            .unwrap_or_default()
    }

    fn select_first(&self, selector: &str) -> Result<ElementRef<'_>> {
        let sel = Selector::parse(selector).map_err(|_| Error::InvalidSelector(selector.to_string()))?;
        self.document
            .select(&sel)
            .next()
            .ok_or_else(|| Error::ElementNotFound(selector.to_string()))
    }

    /// Whether any element matches `selector`
    pub fn contains(&self, selector: &str) -> Result<bool> {
        match self.select_first(selector) {
            Ok(_) => Ok(true),
            Err(Error::ElementNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Snapshot the first element matching `selector`, styles resolved.
    pub fn snapshot(&self, selector: &str) -> Result<ElementSnapshot> {
        let element = self.select_first(selector)?;

        // Resolve inherited properties down the ancestor chain.
        let mut ancestors: Vec<ElementRef> = element.ancestors().filter_map(ElementRef::wrap).collect();
        ancestors.reverse();
        let parent_style = ancestors
            .iter()
            .fold(ComputedStyle::default(), |style, a| self.stylesheet.compute(a, &style));

        Ok(self.snapshot_element(&element, &parent_style))
    }

    fn snapshot_element(&self, element: &ElementRef, parent: &ComputedStyle) -> ElementSnapshot {
        let style = self.stylesheet.compute(element, parent);
        let mut children = Vec::new();
        for child in element.children() {
            match child.value() {
                Node::Text(t) => {
                    let text = t.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !text.is_empty() {
                        children.push(SnapshotNode::Text(text));
                    }
                }
                Node::Element(e) if SKIPPED_TAGS.contains(&e.name()) => {}
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        let snap = self.snapshot_element(&el, &style);
                        if !snap.style.display_none {
                            children.push(SnapshotNode::Element(snap));
                        }
                    }
                }
                _ => {}
            }
        }

        ElementSnapshot {
            tag: element.value().name().to_string(),
            attributes: element
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            style,
            children,
        }
    }

    /// The control bound to `selector`, binding it on first use.
    pub fn control_mut(&mut self, selector: &str) -> Result<&mut Control> {
        if !self.controls.contains_key(selector) {
            let element = self.select_first(selector)?;
            let control = Control {
                selector: selector.to_string(),
                tag: element.value().name().to_string(),
                attributes: element
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                handlers: Vec::new(),
            };
            self.controls.insert(selector.to_string(), control);
        }
        self.controls
            .get_mut(selector)
            .ok_or_else(|| Error::ElementNotFound(selector.to_string()))
    }

    /// The control bound to `selector`, if it has been bound
    pub fn control(&self, selector: &str) -> Option<&Control> {
        self.controls.get(selector)
    }

    /// Current value of an attribute, preferring the control overlay over the document.
    pub fn attr(&self, selector: &str, name: &str) -> Result<Option<String>> {
        if let Some(control) = self.controls.get(selector) {
            return Ok(control.attr(name).map(str::to_string));
        }
        let element = self.select_first(selector)?;
        Ok(element.value().attr(name).map(str::to_string))
    }

    pub fn on_click<F>(&mut self, selector: &str, handler: F) -> Result<()>
    where
        F: Fn(&mut Control) -> Result<()> + Send + Sync + 'static,
    {
        self.control_mut(selector)?.handlers.push(Arc::new(handler));
        Ok(())
    }

    /// Dispatch a click to every handler of the control, stopping at the first error.
    pub fn click(&mut self, selector: &str) -> Result<()> {
        let control = self.control_mut(selector)?;
        let handlers = control.handlers.clone();
        log::debug!("click on `{}` ({} handlers)", selector, handlers.len());
        for handler in handlers {
            handler(&mut *control)?;
        }
        Ok(())
    }

    /// Append a surface to the body, as a capture does with its canvas.
    pub fn append_surface(&mut self, surface: &Surface) {
        self.body.push(AttachedSurface {
            width: surface.width(),
            height: surface.height(),
            fingerprint: surface.fingerprint(),
        });
    }

    pub fn attached_surfaces(&self) -> &[AttachedSurface] {
        &self.body
    }
}
