//! Scene planning: the field mapping from a slide model to presentation objects.
//!
//! The presentation container itself is built elsewhere. This module decides what each
//! element becomes (rectangle or rounded rectangle, line extent, text box geometry) so
//! that the emitting side only has to copy fields.

use log::{debug, warn};
use serde::Serialize;

use crate::error::Result;
use crate::types::{
    Align, Background, Element, ListStyle, Placeholder, Position, Run, ShapeStyle, SlideModel,
    TextContent, TextStyle,
};
use crate::units::PT_PER_IN;

/// Settings for scene planning.
#[derive(Debug, Clone)]
pub struct SceneOptions {
    /// Fraction by which single-line text boxes are widened to absorb font metric drift.
    pub single_line_widen: f64,
    /// A box no taller than this many line heights counts as single-line.
    pub single_line_height_factor: f64,
    /// Line height multiplier used when the element has no explicit line spacing.
    pub default_line_height: f64,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            single_line_widen: 0.02,
            single_line_height_factor: 1.5,
            default_line_height: 1.2,
        }
    }
}

impl SceneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the single-line widen fraction (0.02 = 2%).
    pub fn with_single_line_widen(mut self, fraction: f64) -> Self {
        self.single_line_widen = fraction.max(0.0);
        self
    }
}

/// Turns image sources into something the presentation writer can load.
pub trait ImageResolver {
    /// Return a loadable path or data URI for `src`.
    fn resolve(&mut self, src: &str) -> Result<String>;
}

/// Resolver for local-only conversions: file URLs become paths, everything else passes
/// through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalImageResolver;

impl ImageResolver for LocalImageResolver {
    fn resolve(&mut self, src: &str) -> Result<String> {
        Ok(strip_file_scheme(src).to_string())
    }
}

fn strip_file_scheme(src: &str) -> &str {
    src.strip_prefix("file://").unwrap_or(src)
}

/// Geometry kind of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    Rect,
    RoundRect,
}

/// One object to place on the slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SceneObject {
    Image {
        path: String,
        #[serde(flatten)]
        position: Position,
    },
    /// An image whose source could not be resolved; nothing is emitted for it.
    SkippedImage { src: String, reason: String },
    Shape {
        shape: ShapeKind,
        #[serde(flatten)]
        position: Position,
        text: String,
        style: ShapeStyle,
    },
    /// A line given by origin and extent.
    Line {
        #[serde(flatten)]
        position: Position,
        color: String,
        width: f64,
    },
    List {
        #[serde(flatten)]
        position: Position,
        items: Vec<Run>,
        style: ListStyle,
    },
    Text {
        #[serde(flatten)]
        position: Position,
        content: TextContent,
        style: TextStyle,
    },
}

/// Everything needed to emit one slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePlan {
    pub background: Background,
    pub objects: Vec<SceneObject>,
    /// Regions the caller fills with externally produced content.
    pub placeholders: Vec<Placeholder>,
}

impl ScenePlan {
    /// Objects that will actually be drawn.
    pub fn drawn(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects
            .iter()
            .filter(|o| !matches!(o, SceneObject::SkippedImage { .. }))
    }
}

/// Map a slide model onto scene objects.
pub fn plan_scene(
    model: &SlideModel,
    options: &SceneOptions,
    resolver: &mut dyn ImageResolver,
) -> ScenePlan {
    let background = match &model.background {
        Background::Image { path } => Background::Image {
            path: strip_file_scheme(path).to_string(),
        },
        other => other.clone(),
    };

    let mut objects = Vec::with_capacity(model.elements.len());

    for element in &model.elements {
        let object = match element {
            Element::Image(image) => match resolver.resolve(&image.src) {
                Ok(path) => SceneObject::Image {
                    path,
                    position: image.position,
                },
                Err(e) => {
                    warn!("Skipping image {}: {}", image.src, e);
                    SceneObject::SkippedImage {
                        src: image.src.clone(),
                        reason: e.to_string(),
                    }
                }
            },
            Element::Line(line) => SceneObject::Line {
                position: Position::new(line.x1, line.y1, line.x2 - line.x1, line.y2 - line.y1),
                color: line.color.clone(),
                width: line.width,
            },
            Element::Shape(shape) => SceneObject::Shape {
                shape: if shape.shape.rect_radius > 0.0 {
                    ShapeKind::RoundRect
                } else {
                    ShapeKind::Rect
                },
                position: shape.position,
                text: shape.text.clone().unwrap_or_default(),
                style: shape.shape.clone(),
            },
            Element::List(list) => SceneObject::List {
                position: list.position,
                items: list.items.clone(),
                style: list.style.clone(),
            },
            Element::Text(text) => SceneObject::Text {
                position: text_box_position(&text.position, &text.style, options),
                content: text.content.clone(),
                style: text.style.clone(),
            },
        };
        objects.push(object);
    }

    debug!("Planned {} scene objects", objects.len());

    ScenePlan {
        background,
        objects,
        placeholders: model.placeholders.clone(),
    }
}

/// Widen single-line text boxes so that the renderer's font metrics cannot force a wrap.
///
/// The extra width is added on the side opposite the alignment anchor.
pub fn text_box_position(
    position: &Position,
    style: &TextStyle,
    options: &SceneOptions,
) -> Position {
    let line_height_pt = style
        .line_spacing
        .unwrap_or(style.font_size * options.default_line_height);
    let height_pt = position.h * PT_PER_IN;
    let is_single_line = height_pt <= line_height_pt * options.single_line_height_factor;

    if !is_single_line {
        return *position;
    }

    let increase = position.w * options.single_line_widen;
    let x = match style.align {
        Align::Center => position.x - increase / 2.0,
        Align::Right => position.x - increase,
        Align::Left | Align::Justify => position.x,
    };
    Position::new(x, position.y, position.w + increase, position.h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{ImageElement, LineElement, ShapeElement, TextElement, TextTag};

    struct FailingResolver;

    impl ImageResolver for FailingResolver {
        fn resolve(&mut self, src: &str) -> Result<String> {
            if src.starts_with("http") {
                Err(Error::RenderError("timed out".to_string()))
            } else {
                Ok(src.to_string())
            }
        }
    }

    fn text_style(font_size: f64, align: Align) -> TextStyle {
        TextStyle {
            font_size,
            align,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_line_text_is_widened() {
        // 24pt text, no explicit spacing: single line is up to 24 * 1.2 * 1.5 = 43.2pt
        let position = Position::new(1.0, 1.0, 4.0, 0.5);
        let options = SceneOptions::default();

        let left = text_box_position(&position, &text_style(24.0, Align::Left), &options);
        assert!((left.w - 4.08).abs() < 1e-9);
        assert_eq!(left.x, 1.0);

        let center = text_box_position(&position, &text_style(24.0, Align::Center), &options);
        assert!((center.x - 0.96).abs() < 1e-9);

        let right = text_box_position(&position, &text_style(24.0, Align::Right), &options);
        assert!((right.x - 0.92).abs() < 1e-9);
    }

    #[test]
    fn test_multi_line_text_is_untouched() {
        let position = Position::new(1.0, 1.0, 4.0, 2.0);
        let style = text_style(12.0, Align::Left);
        let planned = text_box_position(&position, &style, &SceneOptions::default());
        assert_eq!(planned, position);
    }

    #[test]
    fn test_widen_factor_is_configurable() {
        let position = Position::new(0.0, 0.0, 5.0, 0.3);
        let options = SceneOptions::new().with_single_line_widen(0.0);
        let planned = text_box_position(&position, &text_style(18.0, Align::Left), &options);
        assert_eq!(planned, position);
    }

    #[test]
    fn test_plan_maps_elements() {
        let mut model = SlideModel::new(Background::Image {
            path: "file:///tmp/bg.png".to_string(),
        });
        model.elements.push(Element::Shape(ShapeElement {
            position: Position::new(0.0, 0.0, 2.0, 1.0),
            text: None,
            shape: ShapeStyle {
                fill: Some("FF0000".to_string()),
                rect_radius: 0.1,
                ..Default::default()
            },
        }));
        model.elements.push(Element::Line(LineElement {
            x1: 1.0,
            y1: 2.0,
            x2: 3.0,
            y2: 2.0,
            width: 2.0,
            color: "000000".to_string(),
        }));
        model.elements.push(Element::Text(TextElement {
            tag: TextTag::H1,
            content: TextContent::Plain("Title".to_string()),
            position: Position::new(0.5, 0.5, 9.0, 3.0),
            style: text_style(32.0, Align::Left),
        }));

        let plan = plan_scene(&model, &SceneOptions::default(), &mut LocalImageResolver);

        assert_eq!(
            plan.background,
            Background::Image {
                path: "/tmp/bg.png".to_string()
            }
        );
        assert!(matches!(
            plan.objects[0],
            SceneObject::Shape { shape: ShapeKind::RoundRect, .. }
        ));
        match &plan.objects[1] {
            SceneObject::Line { position, .. } => {
                assert_eq!(*position, Position::new(1.0, 2.0, 2.0, 0.0));
            }
            other => panic!("expected line, got {:?}", other),
        }
        assert!(matches!(plan.objects[2], SceneObject::Text { .. }));
    }

    #[test]
    fn test_unresolvable_image_is_skipped() {
        let mut model = SlideModel::new(Background::default());
        model.elements.push(Element::Image(ImageElement {
            src: "https://example.com/a.png".to_string(),
            position: Position::new(0.0, 0.0, 1.0, 1.0),
        }));
        model.elements.push(Element::Image(ImageElement {
            src: "logo.png".to_string(),
            position: Position::new(1.0, 0.0, 1.0, 1.0),
        }));

        let plan = plan_scene(&model, &SceneOptions::default(), &mut FailingResolver);

        assert!(matches!(plan.objects[0], SceneObject::SkippedImage { .. }));
        assert_eq!(plan.drawn().count(), 1);
    }
}
