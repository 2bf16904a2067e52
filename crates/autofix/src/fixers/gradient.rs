//! Replaces CSS gradients and background images with solid fills.

use deck_core::{Result, ValidationIssue};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

use crate::css::Declarations;
use crate::markup::{
    inline_style, parse_document, replace_style_text, select_all, serialize, set_inline_style,
    style_sheets,
};

use super::Fixer;

/// Markup that is always worth fixing, whether or not it was reported.
static GRADIENT_MARKUP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"linear-gradient|radial-gradient|background(?:-image)?\s*:[^;}"]*url\("#).unwrap()
});

static HEX_COLOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#(?:[0-9a-fA-F]{8}|[0-9a-fA-F]{6}|[0-9a-fA-F]{3,4})\b").unwrap()
});

static RGB_COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rgba?\([^)]*\)").unwrap());

static NAMED_COLOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(black|white|red|green|blue|yellow|orange|purple|pink|gray|grey|brown|navy|teal|silver|maroon|olive|lime|aqua|cyan|magenta|fuchsia|gold|indigo|violet)\b",
    )
    .unwrap()
});

/// Fill used in place of a background image.
const IMAGE_REPLACEMENT: &str = "#f0f0f0";

/// Colour used when a gradient names no recognisable colour.
const FALLBACK_COLOR: &str = "#000000";

/// The colour a gradient is flattened to: the first hex literal, else the first
/// `rgb()`/`rgba()`, else the first colour name, else black.
pub fn first_color(value: &str) -> String {
    [&HEX_COLOR_REGEX, &RGB_COLOR_REGEX, &NAMED_COLOR_REGEX]
        .iter()
        .find_map(|re| re.find(value))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| FALLBACK_COLOR.to_string())
}

fn is_background(property: &str) -> bool {
    property == "background" || property == "background-image"
}

fn needs_rewrite(declarations: &Declarations) -> bool {
    declarations.iter().any(|d| {
        is_background(&d.property) && (d.value.contains("gradient(") || d.value.contains("url("))
    })
}

fn rewrite(declarations: &mut Declarations) {
    for d in declarations.iter_mut() {
        if !is_background(&d.property) {
            continue;
        }
        if d.value.contains("gradient(") {
            let color = first_color(&d.value);
            debug!("Flattening {} to {}", d.value, color);
            d.property = "background".to_string();
            d.value = color;
        } else if d.value.contains("url(") {
            debug!("Replacing background image {}", d.value);
            d.property = "background".to_string();
            d.value = IMAGE_REPLACEMENT.to_string();
        }
    }
}

/// Flattens gradients to their first colour and background images to a light grey.
#[derive(Debug, Clone, Copy)]
pub struct GradientFixer {
    proactive: bool,
}

impl GradientFixer {
    /// With `proactive`, gradient markup is fixed even when no issue reported it.
    pub fn new(proactive: bool) -> Self {
        Self { proactive }
    }
}

impl Default for GradientFixer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Fixer for GradientFixer {
    fn name(&self) -> &'static str {
        "gradient"
    }

    fn description(&self) -> &'static str {
        "Replaced CSS gradients and background images with solid colors"
    }

    fn can_fix(&self, issues: &[ValidationIssue], markup: &str) -> bool {
        let reported = issues.iter().any(|i| {
            matches!(
                i,
                ValidationIssue::UnsupportedGradient | ValidationIssue::ShapeBackgroundImage
            )
        });
        reported || (self.proactive && GRADIENT_MARKUP_REGEX.is_match(markup))
    }

    fn fix(&self, _issues: &[ValidationIssue], markup: &str) -> Result<Option<String>> {
        let document = parse_document(markup);
        let mut changed = false;

        for (node, mut sheet) in style_sheets(&document) {
            let mut sheet_changed = false;
            for rule in sheet.rules_mut() {
                if needs_rewrite(rule.declarations()) {
                    rewrite(rule.declarations_mut());
                    sheet_changed = true;
                }
            }
            if sheet_changed {
                replace_style_text(&node, &sheet);
                changed = true;
            }
        }

        for element in select_all(&document, "[style]") {
            let mut declarations = inline_style(&element);
            if needs_rewrite(&declarations) {
                rewrite(&mut declarations);
                set_inline_style(&element, &declarations);
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

    const HERO: &str = "<html><head><style>\n.hero { background: linear-gradient(to right, #123456, #abcdef); color: #fff; }\n</style></head><body><div class=\"hero\"></div></body></html>";

    #[test]
    fn test_gradient_becomes_first_color() {
        let fixed = GradientFixer::default().fix(&[], HERO).unwrap().unwrap();
        assert!(fixed.contains(".hero{background:#123456;color:#fff}"), "{}", fixed);
        assert!(!fixed.contains("gradient"));
    }

    #[test]
    fn test_fix_is_idempotent() {
        let fixer = GradientFixer::default();
        let fixed = fixer.fix(&[], HERO).unwrap().unwrap();
        assert_eq!(fixer.fix(&[], &fixed).unwrap(), None);
    }

    #[test]
    fn test_inline_background_image() {
        let markup = r#"<body><div style="background-image: url('photo.jpg'); padding: 4px">x</div></body>"#;
        let fixed = GradientFixer::default().fix(&[], markup).unwrap().unwrap();
        assert!(fixed.contains(r#"style="background:#f0f0f0;padding:4px""#), "{}", fixed);
    }

    #[test]
    fn test_background_shorthand_url_is_replaced() {
        let markup = r#"<html><head><style>.banner { background: url(hero.png) no-repeat center; }</style></head>
<body><div class="banner"></div><div style="background: #123456 url('tile.png') repeat-x">x</div></body></html>"#;
        let fixer = GradientFixer::new(false);
        assert!(fixer.can_fix(&[ValidationIssue::ShapeBackgroundImage], markup));
        assert!(GradientFixer::new(true).can_fix(&[], markup));

        let fixed = fixer.fix(&[ValidationIssue::ShapeBackgroundImage], markup).unwrap().unwrap();
        assert!(fixed.contains(".banner{background:#f0f0f0}"), "{}", fixed);
        assert!(fixed.contains(r#"style="background:#f0f0f0""#), "{}", fixed);
        assert!(!fixed.contains("url("), "{}", fixed);
    }

    #[test]
    fn test_first_color_priority() {
        assert_eq!(first_color("linear-gradient(135deg, rgba(0,0,0,0.5), #fff)"), "#fff");
        assert_eq!(first_color("linear-gradient(rgb(1, 2, 3), red)"), "rgb(1, 2, 3)");
        assert_eq!(first_color("radial-gradient(circle, Navy, blue)"), "Navy");
        assert_eq!(first_color("linear-gradient(to right, transparent, transparent)"), "#000000");
    }

    #[test]
    fn test_can_fix_triggers() {
        let fixer = GradientFixer::new(false);
        assert!(fixer.can_fix(&[ValidationIssue::ShapeBackgroundImage], ""));
        assert!(!fixer.can_fix(&[], HERO));
        assert!(GradientFixer::new(true).can_fix(&[], HERO));
        assert!(!GradientFixer::new(true).can_fix(&[], "<p>plain</p>"));
    }
}
