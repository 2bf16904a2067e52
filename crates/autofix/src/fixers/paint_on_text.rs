//! Moves backgrounds, borders and shadows off text elements onto a wrapping `<div>`.

use std::collections::{HashMap, HashSet};

use deck_core::{Result, ValidationIssue};
use log::debug;

use crate::css::{Declarations, Rule};
use crate::markup::{
    classes, inline_style, new_element, parse_document, remove_class, replace_style_text,
    select_all, serialize, set_attribute, set_inline_style, style_sheets, wrap,
};

use super::Fixer;

/// Splits `.class { border; color }` into `.class { border }` plus `.class tag { color }`
/// and wraps each offending element in `<div class="class">`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PaintOnTextFixer;

impl PaintOnTextFixer {
    /// Tags named by paint-on-text issues, first occurrence first.
    fn offending_tags(issues: &[ValidationIssue]) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for issue in issues {
            if let ValidationIssue::PaintOnText { tag, .. } = issue {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        tags
    }
}

impl Fixer for PaintOnTextFixer {
    fn name(&self) -> &'static str {
        "paint-on-text"
    }

    fn description(&self) -> &'static str {
        "Moved backgrounds, borders and shadows from text elements onto wrapper <div> elements"
    }

    fn can_fix(&self, issues: &[ValidationIssue], _markup: &str) -> bool {
        issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::PaintOnText { .. }))
    }

    fn fix(&self, issues: &[ValidationIssue], markup: &str) -> Result<Option<String>> {
        let tags = Self::offending_tags(issues);
        let document = parse_document(markup);
        let mut sheets = style_sheets(&document);
        let mut sheet_changed = vec![false; sheets.len()];

        // class -> (stylesheet index, text declarations taken out of `.class`)
        let mut split: HashMap<String, (usize, Declarations)> = HashMap::new();
        let mut scoped: HashSet<(String, String)> = HashSet::new();
        let mut changed = false;

        for tag in &tags {
            for element in select_all(&document, tag) {
                let mut wrapper_class = None;

                for class in classes(&element) {
                    if !split.contains_key(&class) {
                        let found = sheets.iter_mut().enumerate().find_map(|(i, (_, sheet))| {
                            sheet.split_class_rule(&class).map(|text| (i, text))
                        });
                        if let Some((index, text)) = found {
                            debug!("Split .{} into container and text rules", class);
                            sheet_changed[index] = true;
                            split.insert(class.clone(), (index, text));
                        }
                    }

                    if let Some((index, text)) = split.get(&class) {
                        if !text.is_empty() && scoped.insert((class.clone(), tag.clone())) {
                            let rule = Rule::new(format!(".{} {}", class, tag), text.clone());
                            sheets[*index].1.insert_rule_after(&format!(".{}", class), rule);
                        }
                        wrapper_class = Some(class);
                        break;
                    }
                }

                let (container, text) = inline_style(&element).split_container();
                if wrapper_class.is_none() && container.is_empty() {
                    continue;
                }

                let wrapper = new_element("div");
                if let Some(class) = &wrapper_class {
                    set_attribute(&wrapper, "class", class);
                    remove_class(&element, class);
                }
                if !container.is_empty() {
                    set_inline_style(&wrapper, &container);
                    set_inline_style(&element, &text);
                }

                debug!("Wrapping <{}> in a container <div>", tag);
                wrap(&element, wrapper);
                changed = true;
            }
        }

        if !changed {
            return Ok(None);
        }

        for ((node, sheet), changed) in sheets.iter().zip(&sheet_changed) {
            if *changed {
                replace_style_text(node, sheet);
            }
        }
        Ok(Some(serialize(&document)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{attribute, select_all};
    use deck_core::TextPaint;

    fn border_on(tag: &str) -> Vec<ValidationIssue> {
        vec![ValidationIssue::PaintOnText {
            tag: tag.to_string(),
            paint: TextPaint::Border,
        }]
    }

    #[test]
    fn test_box_rule_is_split_and_paragraph_wrapped() {
        let markup = r#"<html><head><style>
.box{border:1px solid #000;color:#111}
</style></head><body><p class="box">Boxed</p></body></html>"#;

        let fixed = PaintOnTextFixer.fix(&border_on("p"), markup).unwrap().unwrap();

        assert!(fixed.contains(r#"<div class="box"><p>Boxed</p></div>"#), "{}", fixed);

        let document = parse_document(&fixed);
        let (_, sheet) = style_sheets(&document).remove(0);
        let container = sheet.find_rule(".box").unwrap().declarations();
        assert_eq!(container.get("border"), Some("1px solid #000"));
        assert_eq!(container.get("color"), None);
        let text = sheet.find_rule(".box p").unwrap().declarations();
        assert_eq!(text.get("color"), Some("#111"));
    }

    #[test]
    fn test_inline_paint_moves_to_wrapper() {
        let markup = r#"<body><h2 style="background-color: #eee; color: #333" id="t">Title</h2></body>"#;
        let issues = vec![ValidationIssue::PaintOnText {
            tag: "h2".into(),
            paint: TextPaint::Background,
        }];

        let fixed = PaintOnTextFixer.fix(&issues, markup).unwrap().unwrap();
        let document = parse_document(&fixed);

        let div = select_all(&document, "div").remove(0);
        assert_eq!(attribute(&div, "style").as_deref(), Some("background-color:#eee"));
        let h2 = select_all(&document, "div > h2").remove(0);
        assert_eq!(attribute(&h2, "style").as_deref(), Some("color:#333"));
        assert_eq!(attribute(&h2, "id").as_deref(), Some("t"));
    }

    #[test]
    fn test_shared_class_gets_one_text_rule_per_tag() {
        let markup = r#"<html><head><style>.card { background: #fff; font-size: 14px; }</style></head>
<body><p class="card">A</p><h3 class="card">B</h3><p class="card">C</p></body></html>"#;
        let issues = vec![
            ValidationIssue::PaintOnText { tag: "p".into(), paint: TextPaint::Background },
            ValidationIssue::PaintOnText { tag: "h3".into(), paint: TextPaint::Background },
            ValidationIssue::PaintOnText { tag: "p".into(), paint: TextPaint::Background },
        ];

        let fixed = PaintOnTextFixer.fix(&issues, markup).unwrap().unwrap();
        let document = parse_document(&fixed);
        let (_, sheet) = style_sheets(&document).remove(0);

        assert_eq!(sheet.rules().filter(|r| r.matches(".card p")).count(), 1);
        assert!(sheet.find_rule(".card h3").is_some());
        assert_eq!(select_all(&document, "div.card").len(), 3);
    }

    #[test]
    fn test_nothing_container_only_is_a_no_op() {
        let markup = r#"<html><head><style>.plain { color: #222; }</style></head><body><p class="plain">x</p></body></html>"#;
        assert_eq!(PaintOnTextFixer.fix(&border_on("p"), markup).unwrap(), None);
    }

    #[test]
    fn test_can_fix_requires_paint_issue() {
        assert!(PaintOnTextFixer.can_fix(&border_on("p"), ""));
        assert!(!PaintOnTextFixer.can_fix(&[ValidationIssue::UnsupportedGradient], ""));
    }
}
