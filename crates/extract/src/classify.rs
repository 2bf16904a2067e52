//! First extraction pass: decide what every element of the page becomes.
//!
//! Elements are visited in document order. Once an element is claimed (list items by
//! their list) it is not classified again. The result is a flat list of roles that the
//! building pass turns into slide elements without consulting the tree again.

use deck_core::issues::{excerpt, Axis, TextPaint};
use deck_core::units::is_transparent;
use deck_core::{ExtractOptions, TextTag, ValidationIssue};
use log::debug;

use crate::dom::{RenderedDocument, RenderedElement};

/// Tags that may only hold text.
pub const TEXT_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li"];

const BORDER_WIDTH_PROPERTIES: [&str; 4] = [
    "border-top-width",
    "border-right-width",
    "border-bottom-width",
    "border-left-width",
];

/// Border widths of a container, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderLayout {
    None,
    /// All four edges share one width.
    Uniform(f64),
    /// Top, right, bottom, left.
    Mixed([f64; 4]),
}

impl BorderLayout {
    pub fn from_widths(widths: [f64; 4]) -> Self {
        if widths.iter().all(|w| *w <= 0.0) {
            BorderLayout::None
        } else if widths.iter().all(|w| *w == widths[0]) {
            BorderLayout::Uniform(widths[0])
        } else {
            BorderLayout::Mixed(widths)
        }
    }
}

/// What a painted `<div>` turns into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerPaint {
    pub has_fill: bool,
    pub border: BorderLayout,
}

impl ContainerPaint {
    /// Whether a shape element is emitted (solid fill or uniform stroke).
    pub fn emits_shape(&self) -> bool {
        self.has_fill || matches!(self.border, BorderLayout::Uniform(_))
    }
}

/// The role of one element on the slide.
#[derive(Debug)]
pub enum Role<'a> {
    /// The element cannot be represented; its issue is reported in place.
    Rejected(ValidationIssue),
    Placeholder {
        element: &'a RenderedElement,
        id: String,
    },
    Image(&'a RenderedElement),
    /// A painted `<div>`: a shape and/or border lines.
    Shape {
        element: &'a RenderedElement,
        paint: ContainerPaint,
    },
    List {
        element: &'a RenderedElement,
        items: Vec<&'a RenderedElement>,
    },
    Text {
        element: &'a RenderedElement,
        tag: TextTag,
    },
}

/// Elements in document order with the end of each element's subtree.
struct Flattened<'a> {
    nodes: Vec<&'a RenderedElement>,
    subtree_end: Vec<usize>,
}

impl<'a> Flattened<'a> {
    fn new(root: &'a RenderedElement) -> Self {
        let mut flat = Self {
            nodes: Vec::new(),
            subtree_end: Vec::new(),
        };
        flat.push(root);
        flat
    }

    fn push(&mut self, element: &'a RenderedElement) {
        let index = self.nodes.len();
        self.nodes.push(element);
        self.subtree_end.push(index + 1);
        for child in element.child_elements() {
            self.push(child);
        }
        self.subtree_end[index] = self.nodes.len();
    }
}

/// Classify every element below (and including) the body.
pub fn classify<'a>(doc: &'a RenderedDocument, options: &ExtractOptions) -> Vec<Role<'a>> {
    let flat = Flattened::new(&doc.body);
    let mut claimed = vec![false; flat.nodes.len()];
    let mut roles = Vec::new();
    let mut placeholder_count = 0;

    for (index, element) in flat.nodes.iter().copied().enumerate() {
        if claimed[index] {
            continue;
        }

        if TEXT_TAGS.contains(&element.tag.as_str()) {
            if let Some(paint) = text_paint(element) {
                debug!("<{}> rejected: carries {}", element.tag, paint);
                roles.push(Role::Rejected(ValidationIssue::PaintOnText {
                    tag: element.tag.clone(),
                    paint,
                }));
                continue;
            }
        }

        if element.class_name.contains("placeholder") {
            claimed[index] = true;
            roles.push(classify_placeholder(element, placeholder_count));
            placeholder_count += 1;
            continue;
        }

        if element.is("img") && element.rect.has_area() {
            claimed[index] = true;
            roles.push(Role::Image(element));
            continue;
        }

        if element.is("div") {
            if classify_container(element, &mut roles) {
                claimed[index] = true;
            }
            continue;
        }

        if element.is("ul") || element.is("ol") {
            if !element.rect.has_area() {
                continue;
            }
            // Nested lists flatten into this one; nothing below it is classified again.
            let end = flat.subtree_end[index];
            let items = flat.nodes[index + 1..end]
                .iter()
                .copied()
                .filter(|node| node.is("li"))
                .collect();
            claimed[index..end].fill(true);
            roles.push(Role::List { element, items });
            continue;
        }

        if let Some(tag) = TextTag::from_tag(&element.tag) {
            if let Some(role) = classify_text(element, tag, options) {
                claimed[index] = true;
                roles.push(role);
            }
        }
    }

    roles
}

/// Paint a text tag is not allowed to carry, first of background, border, shadow.
fn text_paint(element: &RenderedElement) -> Option<TextPaint> {
    let style = &element.style;
    let background = style.get("background-color");
    if !is_transparent(background) {
        return Some(TextPaint::Background);
    }

    let has_border = style.px("border-width") > 0.0
        || BORDER_WIDTH_PROPERTIES.iter().any(|p| style.px(p) > 0.0);
    if has_border {
        return Some(TextPaint::Border);
    }

    let shadow = style.get("box-shadow");
    if !shadow.is_empty() && shadow != "none" {
        return Some(TextPaint::Shadow);
    }

    None
}

/// Placeholders without an id are named by their position among placeholders.
fn classify_placeholder(element: &RenderedElement, ordinal: usize) -> Role<'_> {
    let id = if element.id.is_empty() {
        format!("placeholder-{}", ordinal)
    } else {
        element.id.clone()
    };

    let rect = &element.rect;
    if rect.width == 0.0 || rect.height == 0.0 {
        let axis = if rect.width == 0.0 {
            Axis::Width
        } else {
            Axis::Height
        };
        return Role::Rejected(ValidationIssue::ZeroSizePlaceholder { id, axis });
    }
    Role::Placeholder { element, id }
}

/// Classify a `<div>`. Returns whether the element was claimed as a shape.
fn classify_container<'a>(element: &'a RenderedElement, roles: &mut Vec<Role<'a>>) -> bool {
    for text in element.child_texts() {
        let text = text.trim();
        if !text.is_empty() {
            roles.push(Role::Rejected(ValidationIssue::UnwrappedText {
                excerpt: excerpt(text, 50),
            }));
        }
    }

    let style = &element.style;
    let background_image = style.get("background-image");
    if !background_image.is_empty() && background_image != "none" {
        roles.push(Role::Rejected(ValidationIssue::ShapeBackgroundImage));
        return false;
    }

    let widths = BORDER_WIDTH_PROPERTIES.map(|p| style.px(p));
    let paint = ContainerPaint {
        has_fill: !is_transparent(style.get("background-color")),
        border: BorderLayout::from_widths(widths),
    };

    if !paint.has_fill && paint.border == BorderLayout::None {
        return false;
    }
    if !element.rect.has_area() {
        return false;
    }

    roles.push(Role::Shape { element, paint });
    true
}

fn classify_text<'a>(
    element: &'a RenderedElement,
    tag: TextTag,
    options: &ExtractOptions,
) -> Option<Role<'a>> {
    let text = element.text_content();
    let text = text.trim();
    if !element.rect.has_area() || text.is_empty() {
        return None;
    }

    if tag != TextTag::Li && starts_with_bullet(text, options) {
        return Some(Role::Rejected(ValidationIssue::ManualBullet {
            tag: element.tag.clone(),
            excerpt: text.chars().take(20).collect(),
        }));
    }

    Some(Role::Text { element, tag })
}

/// Whether text begins with a bullet glyph followed by whitespace.
pub fn starts_with_bullet(text: &str, options: &ExtractOptions) -> bool {
    let mut chars = text.trim_start().chars();
    match (chars.next(), chars.next()) {
        (Some(glyph), Some(next)) => options.is_bullet_glyph(glyph) && next.is_whitespace(),
        _ => false,
    }
}
