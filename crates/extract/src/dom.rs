//! Snapshot of a rendered HTML slide.
//!
//! The browser collaborator walks the live page and records, for each element, what
//! extraction needs: tag, id, class, image source, bounding rectangle, layout size,
//! computed style and children. The snapshot is exchanged as JSON.

use std::collections::BTreeMap;

use deck_core::units::px_or_zero;
use serde::{Deserialize, Deserializer, Serialize};

/// A rendered page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    /// The `<body>` element and everything below it.
    pub body: RenderedElement,
    /// `body.scrollWidth` in pixels.
    pub scroll_width: f64,
    /// `body.scrollHeight` in pixels.
    pub scroll_height: f64,
}

impl RenderedDocument {
    /// Declared body width in pixels (computed `width`, falling back to the box).
    pub fn width_px(&self) -> f64 {
        self.body
            .style
            .length("width")
            .unwrap_or(self.body.rect.width)
    }

    /// Declared body height in pixels (computed `height`, falling back to the box).
    pub fn height_px(&self) -> f64 {
        self.body
            .style
            .length("height")
            .unwrap_or(self.body.rect.height)
    }
}

/// `getBoundingClientRect()` of an element, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Whether the box has a visible area.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Computed style of an element, keyed by CSS property name (`border-top-width`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputedStyle(BTreeMap<String, String>);

impl ComputedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a property, or the empty string when it was not recorded.
    pub fn get(&self, property: &str) -> &str {
        self.0.get(property).map(String::as_str).unwrap_or("")
    }

    /// A pixel length, if the property holds a number.
    pub fn length(&self, property: &str) -> Option<f64> {
        deck_core::units::parse_css_number(self.get(property))
    }

    /// A pixel length, treating missing values as zero.
    pub fn px(&self, property: &str) -> f64 {
        px_or_zero(self.get(property))
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.0.insert(property.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ComputedStyle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A child of an element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum RenderedNode {
    Element(RenderedElement),
    Text { text: String },
}

/// One rendered element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedElement {
    /// Lowercase tag name.
    #[serde(deserialize_with = "lowercase")]
    pub tag: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub class_name: String,
    /// Resolved `src` of images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default)]
    pub rect: Rect,
    /// `offsetWidth`, the untransformed layout width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_width: Option<f64>,
    /// `offsetHeight`, the untransformed layout height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_height: Option<f64>,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub children: Vec<RenderedNode>,
}

fn lowercase<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.to_ascii_lowercase())
}

impl RenderedElement {
    /// Create an element with the given tag and box.
    pub fn new(tag: impl Into<String>, rect: Rect) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            rect,
            ..Default::default()
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// Individual class names.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.class_name.split_whitespace()
    }

    /// Element children, skipping text nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &RenderedElement> {
        self.children.iter().filter_map(|c| match c {
            RenderedNode::Element(e) => Some(e),
            RenderedNode::Text { .. } => None,
        })
    }

    /// Direct text node children.
    pub fn child_texts(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|c| match c {
            RenderedNode::Text { text } => Some(text.as_str()),
            RenderedNode::Element(_) => None,
        })
    }

    /// Concatenated text of all descendant text nodes (`textContent`).
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                RenderedNode::Text { text } => out.push_str(text),
                RenderedNode::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Whether any descendant element satisfies `pred`.
    pub fn has_descendant(&self, pred: &dyn Fn(&RenderedElement) -> bool) -> bool {
        self.child_elements()
            .any(|e| pred(e) || e.has_descendant(pred))
    }

    /// Layout size before transforms, falling back to the bounding box.
    pub fn layout_size(&self) -> (f64, f64) {
        (
            self.offset_width.unwrap_or(self.rect.width),
            self.offset_height.unwrap_or(self.rect.height),
        )
    }

    /// Add a child element (builder style, mainly for fixtures).
    pub fn with_child(mut self, child: RenderedElement) -> Self {
        self.children.push(RenderedNode::Element(child));
        self
    }

    /// Add a text child (builder style, mainly for fixtures).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(RenderedNode::Text { text: text.into() });
        self
    }

    /// Set a computed style property (builder style, mainly for fixtures).
    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.style.set(property, value);
        self
    }

    pub fn with_class(mut self, class_name: &str) -> Self {
        self.class_name = class_name.to_string();
        self
    }
}
