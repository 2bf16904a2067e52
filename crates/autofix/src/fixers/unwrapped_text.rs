//! Wraps bare text inside `<div>` containers in a block text tag.

use deck_core::{Result, ValidationIssue};
use kuchiki::NodeRef;
use log::debug;

use crate::markup::{attribute, new_element, parse_document, select_all, serialize};

use super::Fixer;

/// Puts every non-blank text node directly inside a `<div>` into a `<p>`, or an `<h3>`
/// when the container is styled as a title.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnwrappedTextFixer;

/// Tag used for text found in a container with the given class attribute.
fn wrapper_tag(class: &str) -> &'static str {
    let is_title =
        class.contains("title") && !class.contains("report-title") && !class.contains("page-title");
    if is_title {
        "h3"
    } else {
        "p"
    }
}

fn non_blank_text(node: &NodeRef) -> Option<String> {
    let text = node.as_text()?.borrow().clone();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

impl Fixer for UnwrappedTextFixer {
    fn name(&self) -> &'static str {
        "unwrapped-text"
    }

    fn description(&self) -> &'static str {
        "Wrapped bare text inside <div> containers in <p> or <h3> tags"
    }

    fn can_fix(&self, issues: &[ValidationIssue], _markup: &str) -> bool {
        issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::UnwrappedText { .. }))
    }

    fn fix(&self, _issues: &[ValidationIssue], markup: &str) -> Result<Option<String>> {
        let document = parse_document(markup);
        let mut changed = false;

        for div in select_all(&document, "div") {
            let tag = wrapper_tag(&attribute(&div, "class").unwrap_or_default());
            let texts: Vec<(NodeRef, String)> = div
                .children()
                .filter_map(|child| non_blank_text(&child).map(|text| (child, text)))
                .collect();

            for (node, text) in texts {
                let content = text.trim();
                let leading = &text[..text.len() - text.trim_start().len()];
                let trailing = &text[text.trim_end().len()..];

                if !leading.is_empty() {
                    node.insert_before(NodeRef::new_text(leading));
                }
                let block = new_element(tag);
                block.append(NodeRef::new_text(content));
                node.insert_before(block);
                if !trailing.is_empty() {
                    node.insert_before(NodeRef::new_text(trailing));
                }
                node.detach();

                debug!("Wrapped text {:?} in <{}>", content, tag);
                changed = true;
            }
        }

        if !changed {
            return Ok(None);
        }
        Ok(Some(serialize(&document)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unwrapped() -> Vec<ValidationIssue> {
        vec![ValidationIssue::UnwrappedText {
            excerpt: "Hello".to_string(),
        }]
    }

    #[test]
    fn test_text_is_wrapped_in_paragraph() {
        let markup = r#"<body><div class="content">Hello</div></body>"#;
        let fixed = UnwrappedTextFixer.fix(&unwrapped(), markup).unwrap().unwrap();
        assert!(fixed.contains(r#"<div class="content"><p>Hello</p></div>"#), "{}", fixed);
    }

    #[test]
    fn test_title_containers_get_headings() {
        let markup = r#"<body><div class="slide-title">Q3 results</div><div class="page-title">Intro</div></body>"#;
        let fixed = UnwrappedTextFixer.fix(&unwrapped(), markup).unwrap().unwrap();
        assert!(fixed.contains(r#"<div class="slide-title"><h3>Q3 results</h3></div>"#));
        assert!(fixed.contains(r#"<div class="page-title"><p>Intro</p></div>"#));
    }

    #[test]
    fn test_children_and_whitespace_keep_their_place() {
        let markup = "<body><div>\n  <h2>Head</h2>\n  tail text\n</div></body>";
        let fixed = UnwrappedTextFixer.fix(&unwrapped(), markup).unwrap().unwrap();
        assert!(fixed.contains("<div>\n  <h2>Head</h2>\n  <p>tail text</p>\n</div>"), "{}", fixed);
    }

    #[test]
    fn test_wrapped_markup_is_unchanged() {
        let markup = "<body><div>\n  <p>Already wrapped</p>\n</div></body>";
        assert_eq!(UnwrappedTextFixer.fix(&unwrapped(), markup).unwrap(), None);
    }

    #[test]
    fn test_wrapper_tag() {
        assert_eq!(wrapper_tag("hero title"), "h3");
        assert_eq!(wrapper_tag("report-title"), "p");
        assert_eq!(wrapper_tag(""), "p");
    }
}
