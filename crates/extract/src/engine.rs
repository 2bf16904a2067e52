//! Layout extraction: turns a rendered snapshot into a slide model.
//!
//! Extraction never stops at the first problem. Every issue is collected into the
//! model's error list; [`extract_checked`] turns a non-empty list into one error.

use deck_core::types::{
    Bullet, ImageElement, LineElement, ListElement, ListStyle, ShapeElement, ShapeStyle, Stroke,
    TextElement, TextStyle,
};
use deck_core::units::{
    alpha_transparency, color_to_hex, corner_radius_in, is_bold_weight, length_to_pt,
    parse_box_shadow, parse_css_number, primary_font_face, px_to_in, px_to_pt, rotation_degrees,
    PT_PER_IN,
};
use deck_core::{
    Align, Background, Diagnostics, Element, ExtractOptions, Placeholder, Position, Result,
    RunOptions, SlideModel, TextContent, TextTag, ValidationIssue,
};
use log::{debug, info};
use regex::Regex;
use std::sync::LazyLock;

use crate::classify::{classify, BorderLayout, ContainerPaint, Role};
use crate::dom::{ComputedStyle, Rect, RenderedDocument, RenderedElement};
use crate::runs::{collapse_whitespace, RunParser, TextTransform, FORMATTING_TAGS};
use crate::validate::validate;

/// Regex for the target of `url(...)`.
static CSS_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(\s*["']?([^"')]+)["']?\s*\)"#).unwrap());

/// Extract a slide model, collecting every problem in `errors`.
pub fn extract(doc: &RenderedDocument, options: &ExtractOptions) -> SlideModel {
    let mut extractor = Extractor::new(options);
    let background = extractor.background(&doc.body);
    let mut model = SlideModel::new(background);

    for role in classify(doc, options) {
        extractor.build(role, &mut model);
    }

    model.errors = extractor.issues;
    let slide_issues = validate(doc, &model, options);
    model.errors.extend(slide_issues);

    info!(
        "Extracted {} elements, {} placeholders, {} issues",
        model.elements.len(),
        model.placeholders.len(),
        model.errors.len()
    );
    model
}

/// Extract a slide model, failing with all collected issues when there are any.
pub fn extract_checked(doc: &RenderedDocument, options: &ExtractOptions) -> Result<SlideModel> {
    let model = extract(doc, options);
    Diagnostics::new(model.errors.clone()).into_result(model)
}

/// Building pass over classified roles.
struct Extractor<'a> {
    options: &'a ExtractOptions,
    issues: Vec<ValidationIssue>,
}

impl<'a> Extractor<'a> {
    fn new(options: &'a ExtractOptions) -> Self {
        Self {
            options,
            issues: Vec::new(),
        }
    }

    fn background(&mut self, body: &RenderedElement) -> Background {
        let style = &body.style;
        let image = style.get("background-image");

        if image.contains("gradient") {
            self.issues.push(ValidationIssue::UnsupportedGradient);
        } else if let Some(caps) = CSS_URL_REGEX.captures(image) {
            return Background::Image {
                path: caps[1].to_string(),
            };
        }

        Background::Color {
            value: color_to_hex(style.get("background-color")),
        }
    }

    fn build(&mut self, role: Role<'_>, model: &mut SlideModel) {
        match role {
            Role::Rejected(issue) => self.issues.push(issue),
            Role::Placeholder { element, id } => {
                let p = inches(&element.rect);
                model.placeholders.push(Placeholder {
                    id,
                    x: p.x,
                    y: p.y,
                    w: p.w,
                    h: p.h,
                });
            }
            Role::Image(element) => match &element.src {
                Some(src) => model.elements.push(Element::Image(ImageElement {
                    src: src.clone(),
                    position: inches(&element.rect),
                })),
                None => debug!("Skipping <img> without a source"),
            },
            Role::Shape { element, paint } => {
                model.elements.extend(container_elements(element, paint));
            }
            Role::List { element, items } => {
                if let Some(list) = self.list(element, &items) {
                    model.elements.push(Element::List(list));
                }
            }
            Role::Text { element, tag } => {
                let text = self.text(element, tag);
                model.elements.push(Element::Text(text));
            }
        }
    }

    fn list(
        &mut self,
        element: &RenderedElement,
        items: &[&RenderedElement],
    ) -> Option<ListElement> {
        let indent = length_to_pt(element.style.get("padding-left")) / 2.0;
        let base = RunOptions {
            break_line: Some(false),
            ..Default::default()
        };

        let mut parser = RunParser::new(self.options);
        let mut groups = Vec::new();
        for item in items {
            let transform = TextTransform::from_css(item.style.get("text-transform"));
            let mut runs = parser.parse(item, &base, transform);

            if let Some(first) = runs.first_mut() {
                first.text = self.strip_bullet(&first.text);
            }
            runs.retain(|r| !r.text.is_empty());

            if let Some(first) = runs.first_mut() {
                first.options.bullet = Some(Bullet { indent });
                groups.push(runs);
            }
        }
        self.issues.extend(parser.into_issues());

        if groups.is_empty() {
            debug!("Skipping <{}> without item text", element.tag);
            return None;
        }

        let last = groups.len() - 1;
        for group in &mut groups[..last] {
            if let Some(run) = group.last_mut() {
                run.options.break_line = Some(true);
            }
        }

        let style_source = items.first().copied().unwrap_or(element);
        let style = &style_source.style;
        let color = style.get("color");

        Some(ListElement {
            items: groups.into_iter().flatten().collect(),
            position: inches(&element.rect),
            style: ListStyle {
                font_size: length_to_pt(style.get("font-size")),
                font_face: primary_font_face(style.get("font-family")),
                color: color_to_hex(color),
                transparency: alpha_transparency(color),
                align: Align::from_css(style.get("text-align")),
                line_spacing: line_spacing_pt(style),
                para_space_before: 0.0,
                para_space_after: length_to_pt(style.get("margin-bottom")),
                margin: [indent, 0.0, 0.0, 0.0],
            },
        })
    }

    /// Remove a leading typed bullet glyph and any whitespace after it.
    fn strip_bullet(&self, text: &str) -> String {
        let mut chars = text.chars();
        match chars.next() {
            Some(glyph) if self.options.is_bullet_glyph(glyph) => {
                chars.as_str().trim_start().to_string()
            }
            _ => text.to_string(),
        }
    }

    fn text(&mut self, element: &RenderedElement, tag: TextTag) -> TextElement {
        let style = &element.style;
        let rotate = rotation_degrees(style.get("transform"), style.get("writing-mode"));
        let color = style.get("color");

        let mut text_style = TextStyle {
            font_size: length_to_pt(style.get("font-size")),
            font_face: primary_font_face(style.get("font-family")),
            color: color_to_hex(color),
            transparency: alpha_transparency(color),
            align: Align::from_css(style.get("text-align")),
            line_spacing: line_spacing_pt(style),
            para_space_before: length_to_pt(style.get("margin-top")),
            para_space_after: length_to_pt(style.get("margin-bottom")),
            margin: [
                length_to_pt(style.get("padding-left")),
                length_to_pt(style.get("padding-right")),
                length_to_pt(style.get("padding-bottom")),
                length_to_pt(style.get("padding-top")),
            ],
            rotate,
            bold: is_bold_weight(style.get("font-weight"))
                && !self.options.skips_bold(style.get("font-family")),
            italic: style.get("font-style") == "italic",
            underline: style.get("text-decoration").contains("underline")
                || style.get("text-decoration-line").contains("underline"),
        };

        let transform = TextTransform::from_css(style.get("text-transform"));
        let formatted = element.has_descendant(&|e| FORMATTING_TAGS.contains(&e.tag.as_str()));

        let content = if formatted {
            let mut parser = RunParser::new(self.options);
            let runs = parser.parse(element, &RunOptions::default(), transform);
            self.issues.extend(parser.into_issues());

            let largest = runs
                .iter()
                .filter_map(|r| r.options.font_size)
                .fold(text_style.font_size, f64::max);
            if largest > text_style.font_size && text_style.font_size > 0.0 {
                if let Some(spacing) = text_style.line_spacing.as_mut() {
                    *spacing *= largest / text_style.font_size;
                }
            }
            TextContent::Runs(runs)
        } else {
            let text = collapse_whitespace(&element.text_content());
            TextContent::Plain(transform.apply(text.trim()))
        };

        TextElement {
            tag,
            content,
            position: text_position(element, rotate),
            style: text_style,
        }
    }
}

/// Explicit line height in points, `None` for `normal`.
fn line_spacing_pt(style: &ComputedStyle) -> Option<f64> {
    let line_height = style.get("line-height");
    if line_height == "normal" {
        return None;
    }
    parse_css_number(line_height).map(px_to_pt)
}

/// A pixel rectangle in inches.
fn inches(rect: &Rect) -> Position {
    Position::new(
        px_to_in(rect.left),
        px_to_in(rect.top),
        px_to_in(rect.width),
        px_to_in(rect.height),
    )
}

/// Unrotated box of a text element, centred on its rendered bounding box.
fn text_position(element: &RenderedElement, rotate: Option<u16>) -> Position {
    let rect = &element.rect;
    let (w, h) = match rotate {
        None => return inches(rect),
        Some(90) | Some(270) => (rect.height, rect.width),
        Some(_) => element.layout_size(),
    };
    let (cx, cy) = rect.center();
    inches(&Rect::new(cx - w / 2.0, cy - h / 2.0, w, h))
}

/// The shape and border lines of a painted container.
fn container_elements(element: &RenderedElement, paint: ContainerPaint) -> Vec<Element> {
    let style = &element.style;
    let rect = &element.rect;
    let position = inches(rect);
    let mut elements = Vec::new();

    if paint.emits_shape() {
        let background = style.get("background-color");
        let line = match paint.border {
            BorderLayout::Uniform(width) => {
                let color = match style.get("border-color") {
                    "" => style.get("border-top-color"),
                    c => c,
                };
                Some(Stroke {
                    color: color_to_hex(color),
                    width: px_to_pt(width),
                })
            }
            _ => None,
        };

        elements.push(Element::Shape(ShapeElement {
            position,
            text: None,
            shape: ShapeStyle {
                fill: paint.has_fill.then(|| color_to_hex(background)),
                transparency: if paint.has_fill {
                    alpha_transparency(background)
                } else {
                    None
                },
                line,
                rect_radius: corner_radius_in(style.get("border-radius"), rect.width, rect.height),
                shadow: parse_box_shadow(style.get("box-shadow")),
            },
        }));
    }

    if let BorderLayout::Mixed([top, right, bottom, left]) = paint.border {
        let Position { x, y, w, h } = position;
        let edge = |px: f64, side: &str, from: (f64, f64), to: (f64, f64)| {
            Element::Line(LineElement {
                x1: from.0,
                y1: from.1,
                x2: to.0,
                y2: to.1,
                width: px_to_pt(px),
                color: color_to_hex(style.get(&format!("border-{}-color", side))),
            })
        };
        let inset = |px: f64| px_to_pt(px) / PT_PER_IN / 2.0;

        if top > 0.0 {
            let i = inset(top);
            elements.push(edge(top, "top", (x, y + i), (x + w, y + i)));
        }
        if right > 0.0 {
            let i = inset(right);
            elements.push(edge(right, "right", (x + w - i, y), (x + w - i, y + h)));
        }
        if bottom > 0.0 {
            let i = inset(bottom);
            elements.push(edge(bottom, "bottom", (x, y + h - i), (x + w, y + h - i)));
        }
        if left > 0.0 {
            let i = inset(left);
            elements.push(edge(left, "left", (x + i, y), (x + i, y + h)));
        }
    }

    elements
}
