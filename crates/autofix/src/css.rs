//! Stylesheet model for rewriting `<style>` blocks and `style` attributes.
//!
//! Parsing is done by lightningcss. The fixers work on an owned copy of the result:
//! top-level style rules with their selector and ordered declarations. Any other rule
//! (at-rules, nested rules) is kept as its printed text. Everything is printed minified.

use std::fmt;

use lightningcss::declaration::DeclarationBlock;
use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, StyleAttribute, StyleSheet};
use lightningcss::traits::ToCss;

use deck_core::{Error, Result};

fn printer() -> PrinterOptions<'static> {
    PrinterOptions {
        minify: true,
        ..PrinterOptions::default()
    }
}

fn css_error(error: impl fmt::Debug) -> Error {
    Error::MarkupError(format!("CSS: {:?}", error))
}

/// Whether a property only makes sense on a container (paint the target format can
/// only draw on shapes).
pub fn is_container_property(property: &str) -> bool {
    property.starts_with("background") || property.starts_with("border") || property == "box-shadow"
}

/// One `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercase property name.
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into().to_lowercase(),
            value: value.into(),
            important: false,
        }
    }

    fn from_property(property: &Property, important: bool) -> Result<Self> {
        let value = property.value_to_css_string(printer()).map_err(css_error)?;
        Ok(Self {
            important,
            ..Self::new(property.property_id().name(), value)
        })
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.property, self.value)?;
        if self.important {
            f.write_str("!important")?;
        }
        Ok(())
    }
}

/// Declarations of a rule or `style` attribute.
///
/// Normal declarations keep source order and come before `!important` ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations(Vec<Declaration>);

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the content of a `style` attribute.
    pub fn parse(style: &str) -> Result<Self> {
        let attribute = StyleAttribute::parse(style, ParserOptions::default()).map_err(css_error)?;
        Self::from_block(&attribute.declarations)
    }

    fn from_block(block: &DeclarationBlock) -> Result<Self> {
        let normal = block.declarations.iter().map(|p| Declaration::from_property(p, false));
        let important = block
            .important_declarations
            .iter()
            .map(|p| Declaration::from_property(p, true));
        normal.chain(important).collect::<Result<Vec<_>>>().map(Self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Declaration> {
        self.0.iter_mut()
    }

    /// Value of the last declaration of `property`.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|d| d.property == property)
            .map(|d| d.value.as_str())
    }

    pub fn push(&mut self, declaration: Declaration) {
        self.0.push(declaration);
    }

    pub fn has_container_properties(&self) -> bool {
        self.0.iter().any(|d| is_container_property(&d.property))
    }

    /// Partition into (container-only, text-safe) declarations, keeping order.
    pub fn split_container(&self) -> (Declarations, Declarations) {
        let (container, text): (Vec<_>, Vec<_>) = self
            .0
            .iter()
            .cloned()
            .partition(|d| is_container_property(&d.property));
        (Declarations(container), Declarations(text))
    }
}

impl fmt::Display for Declarations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl FromIterator<Declaration> for Declarations {
    fn from_iter<I: IntoIterator<Item = Declaration>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A style rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    selector: String,
    declarations: Declarations,
}

impl Rule {
    pub fn new(selector: impl Into<String>, declarations: Declarations) -> Self {
        Self {
            selector: selector.into(),
            declarations,
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    pub fn declarations_mut(&mut self) -> &mut Declarations {
        &mut self.declarations
    }

    pub fn set_declarations(&mut self, declarations: Declarations) {
        self.declarations = declarations;
    }

    /// Whether the selector is exactly `selector`, ignoring whitespace differences.
    pub fn matches(&self, selector: &str) -> bool {
        normalize_selector(&self.selector) == normalize_selector(selector)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{{}}}", self.selector, self.declarations)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Rule(Rule),
    /// Printed form of a rule the fixers never touch.
    Other(String),
}

/// A parsed stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    items: Vec<Item>,
}

impl Stylesheet {
    pub fn parse(source: &str) -> Result<Self> {
        let sheet = StyleSheet::parse(source, ParserOptions::default()).map_err(css_error)?;

        let mut items = Vec::with_capacity(sheet.rules.0.len());
        for rule in &sheet.rules.0 {
            let item = match rule {
                CssRule::Style(style) if style.rules.0.is_empty() => Item::Rule(Rule {
                    selector: style.selectors.to_css_string(printer()).map_err(css_error)?,
                    declarations: Declarations::from_block(&style.declarations)?,
                }),
                other => Item::Other(other.to_css_string(printer()).map_err(css_error)?),
            };
            items.push(item);
        }

        Ok(Self { items })
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.items.iter().filter_map(|item| match item {
            Item::Rule(rule) => Some(rule),
            Item::Other(_) => None,
        })
    }

    pub fn rules_mut(&mut self) -> impl Iterator<Item = &mut Rule> {
        self.items.iter_mut().filter_map(|item| match item {
            Item::Rule(rule) => Some(rule),
            Item::Other(_) => None,
        })
    }

    /// The first rule with exactly this selector.
    pub fn find_rule(&self, selector: &str) -> Option<&Rule> {
        self.rules().find(|r| r.matches(selector))
    }

    fn rule_index(&self, selector: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| matches!(item, Item::Rule(r) if r.matches(selector)))
    }

    /// Strip the text-safe declarations out of the `.class` rule.
    ///
    /// The rule keeps only its container properties. Returns the removed declarations,
    /// or `None` when there is no such rule or it has no container properties.
    pub fn split_class_rule(&mut self, class: &str) -> Option<Declarations> {
        let index = self.rule_index(&format!(".{}", class))?;
        let Item::Rule(rule) = &mut self.items[index] else {
            return None;
        };
        if !rule.declarations.has_container_properties() {
            return None;
        }

        let (container, text) = rule.declarations.split_container();
        rule.set_declarations(container);
        Some(text)
    }

    /// Insert `rule` directly after the first rule matching `anchor`, or at the end.
    pub fn insert_rule_after(&mut self, anchor: &str, rule: Rule) {
        let index = self
            .rule_index(anchor)
            .map(|i| i + 1)
            .unwrap_or(self.items.len());
        self.items.insert(index, Item::Rule(rule));
    }
}

/// One rule per line.
impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            match item {
                Item::Rule(rule) => write!(f, "{}", rule)?,
                Item::Other(text) => f.write_str(text)?,
            }
        }
        Ok(())
    }
}

fn normalize_selector(selector: &str) -> String {
    selector.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stylesheet_keeps_rule_order_and_at_rules() {
        let source = "\n  /* theme */\n  body { width: 720pt; height: 405pt; }\n  \
                      @media print { .x { color: #123456; } }\n  .title{font-size:32px}\n";
        let sheet = Stylesheet::parse(source).unwrap();
        assert_eq!(sheet.rules().count(), 2);
        assert_eq!(sheet.rules().next().unwrap().selector(), "body");
        let title = sheet.find_rule(".title").unwrap();
        assert_eq!(title.declarations().get("font-size"), Some("32px"));

        let printed = sheet.to_string();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "body{width:720pt;height:405pt}");
        assert!(lines[1].starts_with("@media print"), "{}", printed);
        assert!(lines[1].contains("#123456"), "{}", printed);
        assert_eq!(lines[2], ".title{font-size:32px}");
    }

    #[test]
    fn test_declarations_parse() {
        let decls = Declarations::parse(
            "Color: #123456; background-image: url(data:image/png;base64,AAAA); \
             /* note */ padding: 4px !important",
        )
        .unwrap();
        assert_eq!(decls.len(), 3);
        assert_eq!(decls.get("color"), Some("#123456"));
        assert!(decls.get("background-image").unwrap().starts_with("url("));
        assert!(decls.get("background-image").unwrap().contains("base64,AAAA"));
        assert_eq!(decls.get("padding"), Some("4px"));
        assert!(decls.iter().last().unwrap().important);
        assert!(decls.to_string().ends_with("padding:4px!important"));
    }

    #[test]
    fn test_container_properties() {
        assert!(is_container_property("background-color"));
        assert!(is_container_property("border-left"));
        assert!(is_container_property("border-radius"));
        assert!(is_container_property("box-shadow"));
        assert!(!is_container_property("color"));
        assert!(!is_container_property("text-shadow"));
    }

    #[test]
    fn test_split_class_rule() {
        let source = ".box{border:1px solid #000;color:#111}\n.other { color: #222; }";
        let mut sheet = Stylesheet::parse(source).unwrap();
        let text = sheet.split_class_rule("box").unwrap();
        sheet.insert_rule_after(".box", Rule::new(".box p", text));

        let rule = sheet.find_rule(".box").unwrap();
        assert_eq!(rule.declarations().get("border"), Some("1px solid #000"));
        assert_eq!(rule.declarations().get("color"), None);
        let rule = sheet.find_rule(".box p").unwrap();
        assert_eq!(rule.declarations().get("color"), Some("#111"));

        assert_eq!(
            sheet.to_string(),
            ".box{border:1px solid #000}\n.box p{color:#111}\n.other{color:#222}"
        );
    }

    #[test]
    fn test_split_requires_container_properties() {
        let mut sheet = Stylesheet::parse(".plain { color: #222; }").unwrap();
        assert!(sheet.split_class_rule("plain").is_none());
        assert!(sheet.split_class_rule("missing").is_none());
        assert_eq!(sheet.to_string(), ".plain{color:#222}");
    }
}
