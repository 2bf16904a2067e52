//! Validation issues raised while extracting a slide.
//!
//! Every problem is a variant with structured payload so that fixers can match on the
//! kind of problem directly. Human-readable text only exists through `Display`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Paint that text elements are not allowed to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPaint {
    Background,
    Border,
    Shadow,
}

impl fmt::Display for TextPaint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextPaint::Background => "background",
            TextPaint::Border => "border",
            TextPaint::Shadow => "shadow",
        };
        f.write_str(name)
    }
}

/// The collapsed dimension of an empty placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Width,
    Height,
}

/// A box side, used to report inline margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    /// The CSS name of this side.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }
}

/// A single reason why a slide cannot be represented in the target format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ValidationIssue {
    /// A text tag carries background, border or shadow paint.
    PaintOnText { tag: String, paint: TextPaint },

    /// A `<div>` holds text directly instead of inside a text tag.
    UnwrappedText { excerpt: String },

    /// Non-list text starts with a typed bullet glyph.
    ManualBullet { tag: String, excerpt: String },

    /// The slide background is a CSS gradient.
    UnsupportedGradient,

    /// A `<div>` uses a background image.
    ShapeBackgroundImage,

    /// A placeholder collapsed to zero width or height.
    ZeroSizePlaceholder { id: String, axis: Axis },

    /// An inline formatting element has a margin.
    InlineMargin { tag: String, side: Side },

    /// The document size differs from the configured page size.
    SizeMismatch {
        html_width_in: f64,
        html_height_in: f64,
        layout_width_in: f64,
        layout_height_in: f64,
    },

    /// Content is larger than the body box.
    Overflow { horizontal_px: f64, vertical_px: f64 },

    /// A text box ends inside the bottom margin.
    TooCloseToBottom {
        excerpt: String,
        distance_in: f64,
        minimum_in: f64,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::PaintOnText { tag, paint } => write!(
                f,
                "Text element <{}> has {}. Backgrounds, borders, and shadows are only supported on <div> elements, not text elements.",
                tag, paint
            ),
            ValidationIssue::UnwrappedText { excerpt } => write!(
                f,
                "DIV element contains unwrapped text \"{}\". All text must be wrapped in <p>, <h1>-<h6>, <ul>, or <ol> tags.",
                excerpt
            ),
            ValidationIssue::ManualBullet { tag, excerpt } => write!(
                f,
                "Text element <{}> starts with bullet symbol \"{}...\". Use <ul> or <ol> lists instead of manual bullet symbols.",
                tag, excerpt
            ),
            ValidationIssue::UnsupportedGradient => f.write_str(
                "CSS gradients are not supported. Rasterize the gradient to an image and reference it with background-image: url(...), or use a solid color.",
            ),
            ValidationIssue::ShapeBackgroundImage => f.write_str(
                "Background images on DIV elements are not supported. Use solid color or border as shape, or place the picture with an <img> element.",
            ),
            ValidationIssue::ZeroSizePlaceholder { id, axis } => {
                let axis = match axis {
                    Axis::Width => "width",
                    Axis::Height => "height",
                };
                write!(
                    f,
                    "Placeholder \"{}\" has {}: 0. Check the layout CSS.",
                    id, axis
                )
            }
            ValidationIssue::InlineMargin { tag, side } => write!(
                f,
                "Inline element <{}> has margin-{} which is not supported. Remove margin from inline elements.",
                tag,
                side.as_str()
            ),
            ValidationIssue::SizeMismatch {
                html_width_in,
                html_height_in,
                layout_width_in,
                layout_height_in,
            } => write!(
                f,
                "HTML dimensions ({:.1}\" × {:.1}\") don't match presentation layout ({:.1}\" × {:.1}\")",
                html_width_in, html_height_in, layout_width_in, layout_height_in
            ),
            ValidationIssue::Overflow {
                horizontal_px,
                vertical_px,
            } => {
                let mut directions = Vec::new();
                if *horizontal_px > 0.0 {
                    directions.push(format!("{:.1}px horizontally", horizontal_px));
                }
                if *vertical_px > 0.0 {
                    directions.push(format!("{:.1}px vertically", vertical_px));
                }
                write!(f, "HTML content overflows body by {}", directions.join(" and "))?;
                if *vertical_px > 0.0 {
                    f.write_str(" (Remember: leave 0.5\" margin at bottom of slide)")?;
                }
                Ok(())
            }
            ValidationIssue::TooCloseToBottom {
                excerpt,
                distance_in,
                minimum_in,
            } => write!(
                f,
                "Text box \"{}\" ends too close to bottom edge ({:.2}\" from bottom, minimum {}\" required)",
                excerpt, distance_in, minimum_in
            ),
        }
    }
}

/// Shorten `text` to `max` characters, appending `...` when something was cut.
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// The complete list of issues found for one slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(pub Vec<ValidationIssue>);

impl Diagnostics {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self(issues)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }

    /// Turn a non-empty list into an error, keeping `value` otherwise.
    pub fn into_result<T>(self, value: T) -> crate::Result<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(crate::Error::Validation(self))
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => Ok(()),
            [single] => write!(f, "{}", single),
            many => {
                f.write_str("Multiple validation errors found:")?;
                for (i, issue) in many.iter().enumerate() {
                    write!(f, "\n  {}. {}", i + 1, issue)?;
                }
                Ok(())
            }
        }
    }
}
