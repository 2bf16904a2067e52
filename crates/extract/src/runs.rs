//! Inline run parsing.
//!
//! Flattens the inline markup inside a text element (`b`, `strong`, `i`, `em`, `u`,
//! `span`, `br`) into a sequence of runs with uniform character formatting.

use deck_core::issues::Side;
use deck_core::units::{alpha_transparency, color_to_hex, is_bold_weight, length_to_pt};
use deck_core::{ExtractOptions, Run, RunOptions, ValidationIssue};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

use crate::dom::{RenderedElement, RenderedNode};

/// Regex to collapse whitespace runs into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Regex for the first character of each word.
static WORD_START_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w").unwrap());

/// Elements that carry character formatting.
const INLINE_CARRIERS: &[&str] = &["span", "b", "strong", "i", "em", "u"];

/// Elements whose presence makes a text element a run sequence.
pub const FORMATTING_TAGS: &[&str] = &["b", "i", "u", "strong", "em", "span", "br"];

/// Computed `text-transform`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

impl TextTransform {
    pub fn from_css(value: &str) -> Self {
        match value {
            "uppercase" => Self::Uppercase,
            "lowercase" => Self::Lowercase,
            "capitalize" => Self::Capitalize,
            _ => Self::None,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::None => text.to_string(),
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
            Self::Capitalize => WORD_START_REGEX
                .replace_all(text, |caps: &regex::Captures| caps[0].to_uppercase())
                .into_owned(),
        }
    }
}

/// Collapse every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_COLLAPSE_REGEX.replace_all(text, " ").into_owned()
}

/// Parses inline markup into runs, collecting issues for unsupported inline styling.
pub struct RunParser<'a> {
    options: &'a ExtractOptions,
    issues: Vec<ValidationIssue>,
}

impl<'a> RunParser<'a> {
    pub fn new(options: &'a ExtractOptions) -> Self {
        Self {
            options,
            issues: Vec::new(),
        }
    }

    /// Parse the children of `element` into runs starting from `base` formatting.
    ///
    /// The first run loses leading and the last run trailing whitespace; empty runs
    /// are dropped.
    pub fn parse(
        &mut self,
        element: &RenderedElement,
        base: &RunOptions,
        transform: TextTransform,
    ) -> Vec<Run> {
        let mut runs = Vec::new();
        self.collect(element, base, transform, &mut runs);

        if let Some(first) = runs.first_mut() {
            first.text = first.text.trim_start().to_string();
        }
        if let Some(last) = runs.last_mut() {
            last.text = last.text.trim_end().to_string();
        }
        runs.retain(|r| !r.text.is_empty());
        runs
    }

    /// Issues found so far.
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    fn collect(
        &mut self,
        element: &RenderedElement,
        base: &RunOptions,
        transform: TextTransform,
        runs: &mut Vec<Run>,
    ) {
        for child in &element.children {
            match child {
                RenderedNode::Text { text } => {
                    push_fragment(runs, &transform.apply(&collapse_whitespace(text)), base);
                }
                RenderedNode::Element(node) if node.is("br") => {
                    push_fragment(runs, "\n", base);
                }
                RenderedNode::Element(node) => {
                    if node.text_content().trim().is_empty() {
                        continue;
                    }
                    if !INLINE_CARRIERS.contains(&node.tag.as_str()) {
                        debug!("Ignoring unsupported inline element <{}>", node.tag);
                        continue;
                    }

                    let (options, child_transform) = self.carrier_options(node, base, transform);
                    self.collect(node, &options, child_transform, runs);
                }
            }
        }
    }

    fn carrier_options(
        &mut self,
        node: &RenderedElement,
        base: &RunOptions,
        transform: TextTransform,
    ) -> (RunOptions, TextTransform) {
        let style = &node.style;
        let mut options = base.clone();

        if is_bold_weight(style.get("font-weight"))
            && !self.options.skips_bold(style.get("font-family"))
        {
            options.bold = Some(true);
        }
        if style.get("font-style") == "italic" {
            options.italic = Some(true);
        }
        if style.get("text-decoration").contains("underline")
            || style.get("text-decoration-line").contains("underline")
        {
            options.underline = Some(true);
        }

        let color = style.get("color");
        if !color.is_empty() && color != "rgb(0, 0, 0)" {
            options.color = Some(color_to_hex(color));
            if let Some(transparency) = alpha_transparency(color) {
                options.transparency = Some(transparency);
            }
        }

        if !style.get("font-size").is_empty() {
            options.font_size = Some(length_to_pt(style.get("font-size")));
        }

        let child_transform = match TextTransform::from_css(style.get("text-transform")) {
            TextTransform::None => transform,
            other => other,
        };

        for side in Side::ALL {
            if style.px(&format!("margin-{}", side.as_str())) > 0.0 {
                self.issues.push(ValidationIssue::InlineMargin {
                    tag: node.tag.clone(),
                    side,
                });
            }
        }

        (options, child_transform)
    }
}

/// Append text, merging into the previous run when formatting is identical.
fn push_fragment(runs: &mut Vec<Run>, text: &str, options: &RunOptions) {
    if let Some(last) = runs.last_mut() {
        if last.options == *options {
            last.text.push_str(text);
            return;
        }
    }
    runs.push(Run::new(text, options.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Rect;

    fn p() -> RenderedElement {
        RenderedElement::new("p", Rect::new(0.0, 0.0, 200.0, 40.0))
    }

    fn inline(tag: &str, text: &str) -> RenderedElement {
        RenderedElement::new(tag, Rect::default()).with_text(text)
    }

    #[test]
    fn test_adjacent_plain_fragments_merge() {
        let el = p()
            .with_text("  Line   one ")
            .with_child(RenderedElement::new("br", Rect::default()))
            .with_text(" line two  ");

        let options = ExtractOptions::new();
        let runs = RunParser::new(&options).parse(&el, &RunOptions::default(), TextTransform::None);

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Line one \n line two");
    }

    #[test]
    fn test_only_outer_runs_are_trimmed() {
        let el = p()
            .with_text("  Hello ")
            .with_child(inline("b", " bold ").with_style("font-weight", "700"))
            .with_text(" world  ");

        let options = ExtractOptions::new();
        let runs = RunParser::new(&options).parse(&el, &RunOptions::default(), TextTransform::None);

        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].text, "Hello ");
        assert_eq!(runs[1].text, " bold ");
        assert_eq!(runs[1].options.bold, Some(true));
        assert_eq!(runs[2].text, " world");
    }

    #[test]
    fn test_carrier_formatting() {
        let span = inline("span", "styled")
            .with_style("font-style", "italic")
            .with_style("text-decoration", "underline solid rgb(0, 0, 0)")
            .with_style("color", "rgba(255, 0, 0, 0.5)")
            .with_style("font-size", "32px");
        let el = p().with_child(span);

        let options = ExtractOptions::new();
        let runs = RunParser::new(&options).parse(&el, &RunOptions::default(), TextTransform::None);

        let opts = &runs[0].options;
        assert_eq!(opts.italic, Some(true));
        assert_eq!(opts.underline, Some(true));
        assert_eq!(opts.color.as_deref(), Some("FF0000"));
        assert_eq!(opts.transparency, Some(50));
        assert_eq!(opts.font_size, Some(24.0));
        assert_eq!(opts.bold, None);
    }

    #[test]
    fn test_black_color_is_inherited() {
        let el = p().with_child(inline("em", "x").with_style("color", "rgb(0, 0, 0)"));
        let options = ExtractOptions::new();
        let runs = RunParser::new(&options).parse(&el, &RunOptions::default(), TextTransform::None);
        assert_eq!(runs[0].options.color, None);
    }

    #[test]
    fn test_single_weight_font_is_not_bolded() {
        let el = p().with_child(
            inline("strong", "Loud")
                .with_style("font-weight", "700")
                .with_style("font-family", "Impact, sans-serif"),
        );
        let options = ExtractOptions::new();
        let runs = RunParser::new(&options).parse(&el, &RunOptions::default(), TextTransform::None);
        assert_eq!(runs[0].options.bold, None);
    }

    #[test]
    fn test_inline_margin_is_reported() {
        let el = p().with_child(
            inline("span", "gap")
                .with_style("margin-left", "8px")
                .with_style("margin-top", "0px"),
        );
        let options = ExtractOptions::new();
        let mut parser = RunParser::new(&options);
        let runs = parser.parse(&el, &RunOptions::default(), TextTransform::None);

        assert_eq!(runs.len(), 1);
        assert_eq!(
            parser.into_issues(),
            vec![ValidationIssue::InlineMargin {
                tag: "span".to_string(),
                side: Side::Left,
            }]
        );
    }

    #[test]
    fn test_text_transform_is_inherited_by_descendants() {
        let el = p()
            .with_text("plain ")
            .with_child(
                inline("span", "")
                    .with_style("text-transform", "uppercase")
                    .with_child(inline("b", "shout").with_style("font-weight", "700")),
            );
        let options = ExtractOptions::new();
        let runs =
            RunParser::new(&options).parse(&el, &RunOptions::default(), TextTransform::Capitalize);

        assert_eq!(runs[0].text, "Plain ");
        assert_eq!(runs[1].text, "SHOUT");
    }

    #[test]
    fn test_unsupported_elements_and_blank_carriers_are_skipped() {
        let el = p()
            .with_text("keep")
            .with_child(inline("code", "dropped"))
            .with_child(inline("span", "   "));
        let options = ExtractOptions::new();
        let runs = RunParser::new(&options).parse(&el, &RunOptions::default(), TextTransform::None);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "keep");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(TextTransform::Capitalize.apply("hello big world"), "Hello Big World");
        assert_eq!(TextTransform::from_css("none"), TextTransform::None);
    }
}
