//! Helpers over a parsed HTML document.

use html5ever::{LocalName, Namespace, QualName};
use kuchiki::traits::TendrilSink;
use kuchiki::{Attribute, ExpandedName, NodeRef};

use deck_core::Result;
use log::{debug, warn};

use crate::css::{Declarations, Stylesheet};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parse a complete HTML document.
pub fn parse_document(markup: &str) -> NodeRef {
    kuchiki::parse_html().one(markup)
}

/// Serialize a document back to HTML.
pub fn serialize(document: &NodeRef) -> Result<String> {
    let mut out = Vec::new();
    document.serialize(&mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// A new, detached HTML element.
pub fn new_element(tag: &str) -> NodeRef {
    let name = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag));
    NodeRef::new_element(name, Vec::<(ExpandedName, Attribute)>::new())
}

/// All elements matching a CSS selector, collected so the tree can be mutated afterwards.
pub fn select_all(document: &NodeRef, selector: &str) -> Vec<NodeRef> {
    match document.select(selector) {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(()) => Vec::new(),
    }
}

pub fn tag_name(node: &NodeRef) -> Option<String> {
    node.as_element().map(|e| e.name.local.to_string())
}

pub fn attribute(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|e| e.attributes.borrow().get(name).map(str::to_string))
}

pub fn set_attribute(node: &NodeRef, name: &str, value: &str) {
    if let Some(element) = node.as_element() {
        element.attributes.borrow_mut().insert(name, value.to_string());
    }
}

pub fn remove_attribute(node: &NodeRef, name: &str) {
    if let Some(element) = node.as_element() {
        element.attributes.borrow_mut().remove(name);
    }
}

/// Class names of an element.
pub fn classes(node: &NodeRef) -> Vec<String> {
    attribute(node, "class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Remove one class, dropping the attribute when no class is left.
pub fn remove_class(node: &NodeRef, class: &str) {
    let remaining: Vec<String> = classes(node).into_iter().filter(|c| c != class).collect();
    if remaining.is_empty() {
        remove_attribute(node, "class");
    } else {
        set_attribute(node, "class", &remaining.join(" "));
    }
}

/// Put `node` inside `wrapper`, which takes its place in the tree.
pub fn wrap(node: &NodeRef, wrapper: NodeRef) {
    node.insert_before(wrapper.clone());
    wrapper.append(node.clone());
}

/// Parsed inline `style` attribute, empty when missing or unparsable.
pub fn inline_style(node: &NodeRef) -> Declarations {
    let Some(style) = attribute(node, "style") else {
        return Declarations::default();
    };
    match Declarations::parse(&style) {
        Ok(declarations) => declarations,
        Err(e) => {
            debug!("Ignoring style attribute {:?}: {}", style, e);
            Declarations::default()
        }
    }
}

/// Replace the inline `style` attribute, removing it when empty.
pub fn set_inline_style(node: &NodeRef, declarations: &Declarations) {
    if declarations.is_empty() {
        remove_attribute(node, "style");
    } else {
        set_attribute(node, "style", &declarations.to_string());
    }
}

/// Every `<style>` element with its parsed content. Unparsable blocks are skipped.
pub fn style_sheets(document: &NodeRef) -> Vec<(NodeRef, Stylesheet)> {
    select_all(document, "style")
        .into_iter()
        .filter_map(|node| match Stylesheet::parse(&node.text_contents()) {
            Ok(sheet) => Some((node, sheet)),
            Err(e) => {
                warn!("Skipping <style> block: {}", e);
                None
            }
        })
        .collect()
}

/// Replace the content of a `<style>` element with a serialized stylesheet.
pub fn replace_style_text(style: &NodeRef, sheet: &Stylesheet) {
    for child in style.children().collect::<Vec<_>>() {
        child.detach();
    }
    style.append(NodeRef::new_text(sheet.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_and_classes() {
        let doc = parse_document(r#"<body><p class="box lead" id="x">Hi</p></body>"#);
        let p = select_all(&doc, "p").remove(0);

        let wrapper = new_element("div");
        set_attribute(&wrapper, "class", "box");
        wrap(&p, wrapper);
        remove_class(&p, "box");

        let html = serialize(&doc).unwrap();
        assert!(html.contains(r#"<div class="box"><p class="lead" id="x">Hi</p></div>"#));
    }

    #[test]
    fn test_remove_last_class_drops_attribute() {
        let doc = parse_document(r#"<p class="box">Hi</p>"#);
        let p = select_all(&doc, "p").remove(0);
        remove_class(&p, "box");
        assert_eq!(attribute(&p, "class"), None);
        assert_eq!(tag_name(&p).as_deref(), Some("p"));
    }

    #[test]
    fn test_style_text_replacement() {
        let doc = parse_document(
            "<html><head><style>.a { color: #123456; }</style></head><body></body></html>",
        );
        let (node, mut sheet) = style_sheets(&doc).remove(0);
        for rule in sheet.rules_mut() {
            rule.declarations_mut().push(crate::css::Declaration::new("margin", "0"));
        }
        replace_style_text(&node, &sheet);
        assert!(serialize(&doc).unwrap().contains("<style>.a{color:#123456;margin:0}</style>"));
    }

    #[test]
    fn test_inline_style() {
        let doc = parse_document(r#"<p style="color: #123456; border: 1px solid #000">x</p>"#);
        let p = select_all(&doc, "p").remove(0);
        let (container, text) = inline_style(&p).split_container();
        set_inline_style(&p, &text);
        assert_eq!(container.get("border"), Some("1px solid #000"));
        assert_eq!(attribute(&p, "style").as_deref(), Some("color:#123456"));
    }
}
