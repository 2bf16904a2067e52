//! Domain types for representing an extracted slide.
//!
//! Positions and sizes are in inches, font sizes and spacing in points, colours are six
//! hex digits with a separate 0-100 transparency.

use serde::{Deserialize, Serialize};

use crate::issues::ValidationIssue;

/// Everything extracted from one rendered slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideModel {
    /// Paint behind all elements.
    pub background: Background,

    /// Drawable elements in document order.
    pub elements: Vec<Element>,

    /// Regions reserved for externally inserted content.
    pub placeholders: Vec<Placeholder>,

    /// Problems found during extraction and validation, in discovery order.
    pub errors: Vec<ValidationIssue>,
}

impl SlideModel {
    /// Create an empty model with the given background.
    pub fn new(background: Background) -> Self {
        Self {
            background,
            elements: Vec::new(),
            placeholders: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Whether the slide can be emitted as-is.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Text-bearing elements (text boxes and lists).
    pub fn text_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(|e| matches!(e, Element::Text(_) | Element::List(_)))
    }
}

/// Slide background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Background {
    Color { value: String },
    Image { path: String },
}

impl Default for Background {
    fn default() -> Self {
        Background::Color {
            value: "FFFFFF".to_string(),
        }
    }
}

/// A rectangle in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// A tagged empty region filled later by the caller (charts and the like).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placeholder {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// One drawable element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Text(TextElement),
    Image(ImageElement),
    Shape(ShapeElement),
    Line(LineElement),
    List(ListElement),
}

impl Element {
    /// Bounding position, when the element has one.
    pub fn position(&self) -> Option<&Position> {
        match self {
            Element::Text(t) => Some(&t.position),
            Element::Image(i) => Some(&i.position),
            Element::Shape(s) => Some(&s.position),
            Element::List(l) => Some(&l.position),
            Element::Line(_) => None,
        }
    }
}

/// The HTML tag a text box came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTag {
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Li,
}

impl TextTag {
    /// Map a lowercase HTML tag name to a text tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p" => Some(Self::P),
            "h1" => Some(Self::H1),
            "h2" => Some(Self::H2),
            "h3" => Some(Self::H3),
            "h4" => Some(Self::H4),
            "h5" => Some(Self::H5),
            "h6" => Some(Self::H6),
            "li" => Some(Self::Li),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P => "p",
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
            Self::Li => "li",
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Align {
    /// Interpret a computed `text-align`.
    pub fn from_css(value: &str) -> Self {
        match value {
            "center" => Align::Center,
            "right" | "end" => Align::Right,
            "justify" => Align::Justify,
            _ => Align::Left,
        }
    }
}

/// A text box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub tag: TextTag,
    pub content: TextContent,
    pub position: Position,
    pub style: TextStyle,
}

/// Text box content: either one plain string or a run sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextContent {
    Plain(String),
    Runs(Vec<Run>),
}

impl TextContent {
    /// The first non-empty piece of text, for diagnostics.
    pub fn leading_text(&self) -> &str {
        match self {
            TextContent::Plain(text) => text,
            TextContent::Runs(runs) => runs
                .iter()
                .map(|r| r.text.as_str())
                .find(|t| !t.is_empty())
                .unwrap_or(""),
        }
    }
}

/// Paragraph-level style of a text box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_size: f64,
    pub font_face: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<u8>,
    pub align: Align,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f64>,
    pub para_space_before: f64,
    pub para_space_after: f64,
    /// Inner margins in points: left, right, bottom, top.
    pub margin: [f64; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<u16>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

/// A run of text with uniform character formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub options: RunOptions,
}

impl Run {
    pub fn new(text: impl Into<String>, options: RunOptions) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }
}

/// Character formatting of a run. Unset fields inherit from the text box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet: Option<Bullet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_line: Option<bool>,
}

/// Structural bullet of a list item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    /// Distance between bullet and text, in points.
    pub indent: f64,
}

/// A picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    /// URI as rendered: http(s) URL, file URL, relative path or data URI.
    pub src: String,
    pub position: Position,
}

impl ImageElement {
    /// Whether the image must be fetched before emission.
    pub fn is_remote(&self) -> bool {
        self.src.starts_with("http://") || self.src.starts_with("https://")
    }
}

/// A filled and/or stroked rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeElement {
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub shape: ShapeStyle,
}

/// Paint of a shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Stroke>,
    /// Corner radius in inches; `1.0` means a full ellipse.
    pub rect_radius: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,
}

/// Outline of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    /// Width in points.
    pub width: f64,
}

/// Outer drop shadow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    #[serde(rename = "type")]
    pub kind: ShadowKind,
    /// Direction of the offset in degrees, [0, 360).
    pub angle: u16,
    /// Blur radius in points.
    pub blur: f64,
    pub color: String,
    /// Offset distance in points.
    pub offset: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowKind {
    Outer,
}

/// One edge of a non-uniform border.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineElement {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Stroke width in points.
    pub width: f64,
    pub color: String,
}

/// A bulleted or numbered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListElement {
    /// Runs of all items in order. The first run of each item carries the bullet; every
    /// item except the last ends with a run marked `breakLine`.
    pub items: Vec<Run>,
    pub position: Position,
    pub style: ListStyle,
}

impl ListElement {
    /// Group the flattened runs back into one run list per item.
    pub fn item_runs(&self) -> Vec<&[Run]> {
        let mut groups = Vec::new();
        let mut start = 0;
        for (i, run) in self.items.iter().enumerate() {
            if i > start && run.options.bullet.is_some() {
                groups.push(&self.items[start..i]);
                start = i;
            }
        }
        if start < self.items.len() {
            groups.push(&self.items[start..]);
        }
        groups
    }
}

/// Paragraph style shared by all items of a list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStyle {
    pub font_size: f64,
    pub font_face: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<u8>,
    pub align: Align,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f64>,
    pub para_space_before: f64,
    pub para_space_after: f64,
    /// Margins in points: left (bullet indent), right, bottom, top.
    pub margin: [f64; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_serializes_with_type_tag() {
        let element = Element::Line(LineElement {
            x1: 0.0,
            y1: 0.5,
            x2: 1.0,
            y2: 0.5,
            width: 1.5,
            color: "000000".to_string(),
        });
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["type"], "line");
        assert_eq!(json["width"], 1.5);
    }

    #[test]
    fn test_run_options_skip_unset_fields() {
        let run = Run::new(
            "Hi",
            RunOptions {
                bold: Some(true),
                ..Default::default()
            },
        );
        let json = serde_json::to_string(&run).unwrap();
        assert_eq!(json, r#"{"text":"Hi","options":{"bold":true}}"#);
    }

    #[test]
    fn test_list_item_runs_grouping() {
        let bullet = Some(Bullet { indent: 15.0 });
        let list = ListElement {
            items: vec![
                Run::new("One", RunOptions { bullet, ..Default::default() }),
                Run::new(" more", RunOptions { break_line: Some(true), ..Default::default() }),
                Run::new("Two", RunOptions { bullet, ..Default::default() }),
            ],
            position: Position::default(),
            style: ListStyle::default(),
        };

        let groups = list.item_runs();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1][0].text, "Two");
    }

    #[test]
    fn test_leading_text() {
        let content = TextContent::Runs(vec![
            Run::new("", RunOptions::default()),
            Run::new("Body", RunOptions::default()),
        ]);
        assert_eq!(content.leading_text(), "Body");
        assert_eq!(TextContent::Plain("Title".into()).leading_text(), "Title");
    }

    #[test]
    fn test_align_from_css() {
        assert_eq!(Align::from_css("start"), Align::Left);
        assert_eq!(Align::from_css("center"), Align::Center);
        assert_eq!(Align::from_css("end"), Align::Right);
    }
}
