//! Checks that run on a finished slide model: body overflow, page size and the
//! bottom margin of text.

use deck_core::issues::excerpt;
use deck_core::types::Element;
use deck_core::units::px_to_in;
use deck_core::{ExtractOptions, SlideModel, ValidationIssue};
use log::debug;

use crate::dom::RenderedDocument;

/// Run every slide-level check, in reporting order.
pub fn validate(
    doc: &RenderedDocument,
    model: &SlideModel,
    options: &ExtractOptions,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    issues.extend(check_overflow(doc, options));
    issues.extend(check_layout(doc, options));
    issues.extend(check_bottom_margin(doc, model, options));
    issues
}

/// Content scrolling past the declared body size.
pub fn check_overflow(doc: &RenderedDocument, options: &ExtractOptions) -> Option<ValidationIssue> {
    let tolerance = options.overflow_tolerance_px;
    let horizontal_px = (doc.scroll_width - doc.width_px() - tolerance).max(0.0);
    let vertical_px = (doc.scroll_height - doc.height_px() - tolerance).max(0.0);

    if horizontal_px > 0.0 || vertical_px > 0.0 {
        debug!(
            "Body overflows by {}px x {}px",
            horizontal_px, vertical_px
        );
        Some(ValidationIssue::Overflow {
            horizontal_px,
            vertical_px,
        })
    } else {
        None
    }
}

/// Document size against the configured page layout.
pub fn check_layout(doc: &RenderedDocument, options: &ExtractOptions) -> Option<ValidationIssue> {
    let html_width_in = px_to_in(doc.width_px());
    let html_height_in = px_to_in(doc.height_px());
    let layout = options.layout;

    let tolerance = options.layout_tolerance_in;
    if (html_width_in - layout.width_in).abs() > tolerance
        || (html_height_in - layout.height_in).abs() > tolerance
    {
        return Some(ValidationIssue::SizeMismatch {
            html_width_in,
            html_height_in,
            layout_width_in: layout.width_in,
            layout_height_in: layout.height_in,
        });
    }
    None
}

/// Text boxes above the minimum font size that end inside the bottom margin.
pub fn check_bottom_margin(
    doc: &RenderedDocument,
    model: &SlideModel,
    options: &ExtractOptions,
) -> Vec<ValidationIssue> {
    let page_height_in = px_to_in(doc.height_px());
    let minimum_in = px_to_in(options.bottom_margin_px);

    model
        .text_elements()
        .filter_map(|element| {
            let (font_size, bottom, text) = match element {
                Element::Text(t) => (
                    t.style.font_size,
                    t.position.bottom(),
                    t.content.leading_text().to_string(),
                ),
                Element::List(l) => (
                    l.style.font_size,
                    l.position.bottom(),
                    l.items.first().map(|r| r.text.clone()).unwrap_or_default(),
                ),
                _ => return None,
            };

            if font_size <= options.margin_check_min_font_pt {
                return None;
            }

            let distance_in = page_height_in - bottom;
            if distance_in < minimum_in {
                Some(ValidationIssue::TooCloseToBottom {
                    excerpt: excerpt(&text, 50),
                    distance_in,
                    minimum_in,
                })
            } else {
                None
            }
        })
        .collect()
}
