//! Unit conversions and CSS value interpretation.
//!
//! Browser computed styles are expressed in CSS pixels. The target format positions
//! things in inches and sizes text and strokes in points: 1in = 96px = 72pt.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{Shadow, ShadowKind};

pub const PX_PER_IN: f64 = 96.0;
pub const PT_PER_IN: f64 = 72.0;
pub const PT_PER_PX: f64 = 0.75;

/// Colour used whenever a colour is transparent or cannot be parsed.
pub const WHITE_HEX: &str = "FFFFFF";

/// Leading number of a CSS value, the way `parseFloat` reads it.
static LEADING_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)").unwrap());

static RGB_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rgba?\(\s*(\d+(?:\.\d+)?)\s*,\s*(\d+(?:\.\d+)?)\s*,\s*(\d+(?:\.\d+)?)").unwrap()
});

static RGBA_ALPHA_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rgba\(\s*[\d.]+\s*,\s*[\d.]+\s*,\s*[\d.]+\s*,\s*([\d.]+)\s*\)").unwrap()
});

static HEX_COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9a-fA-F]{6}|[0-9a-fA-F]{3})$").unwrap());

static ROTATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rotate\((-?\d+(?:\.\d+)?)deg\)").unwrap());

static MATRIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"matrix\(([^)]+)\)").unwrap());

static SHADOW_COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rgba?\([^)]+\)").unwrap());

static SHADOW_LENGTH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?[\d.]+)(px|pt)").unwrap());

/// Convert CSS pixels to inches.
pub fn px_to_in(px: f64) -> f64 {
    px / PX_PER_IN
}

/// Convert CSS pixels to points.
pub fn px_to_pt(px: f64) -> f64 {
    px * PT_PER_PX
}

/// Read the leading number of a CSS value (`"16px"` → 16, `"normal"` → None).
pub fn parse_css_number(value: &str) -> Option<f64> {
    LEADING_NUMBER_REGEX
        .captures(value)
        .and_then(|c| c[1].parse::<f64>().ok())
}

/// Read a pixel length, treating anything unparsable as zero.
pub fn px_or_zero(value: &str) -> f64 {
    parse_css_number(value).unwrap_or(0.0)
}

/// Convert a pixel length string straight to points.
pub fn length_to_pt(value: &str) -> f64 {
    px_to_pt(px_or_zero(value))
}

/// Whether a computed colour is fully transparent.
pub fn is_transparent(color: &str) -> bool {
    let compact: String = color.chars().filter(|c| !c.is_whitespace()).collect();
    compact.is_empty() || compact == "transparent" || compact == "rgba(0,0,0,0)"
}

/// A colour in target-format terms.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorValue {
    /// Six uppercase hex digits, no leading `#`.
    pub hex: String,
    /// 0 (opaque) to 100 (invisible), present only when the source had an alpha channel.
    pub transparency: Option<u8>,
}

/// Interpret a computed CSS colour.
pub fn parse_color(color: &str) -> ColorValue {
    if is_transparent(color) {
        return ColorValue {
            hex: WHITE_HEX.to_string(),
            transparency: None,
        };
    }
    ColorValue {
        hex: color_to_hex(color),
        transparency: alpha_transparency(color),
    }
}

/// Hex digits for a computed colour; transparent or unknown colours become white.
pub fn color_to_hex(color: &str) -> String {
    if is_transparent(color) {
        return WHITE_HEX.to_string();
    }

    if let Some(caps) = RGB_REGEX.captures(color) {
        let channel = |i: usize| -> u8 {
            caps[i]
                .parse::<f64>()
                .map(|v| v.round().clamp(0.0, 255.0) as u8)
                .unwrap_or(0)
        };
        return format!("{:02X}{:02X}{:02X}", channel(1), channel(2), channel(3));
    }

    if let Some(caps) = HEX_COLOR_REGEX.captures(color.trim()) {
        let digits = &caps[1];
        if digits.len() == 3 {
            return digits
                .chars()
                .flat_map(|c| [c, c])
                .collect::<String>()
                .to_uppercase();
        }
        return digits.to_uppercase();
    }

    WHITE_HEX.to_string()
}

/// Transparency percentage derived from an `rgba()` alpha channel.
pub fn alpha_transparency(color: &str) -> Option<u8> {
    let caps = RGBA_ALPHA_REGEX.captures(color)?;
    let alpha: f64 = caps[1].parse().ok()?;
    Some(((1.0 - alpha.clamp(0.0, 1.0)) * 100.0).round() as u8)
}

/// Normalise an angle in degrees into [0, 360).
pub fn normalize_degrees(angle: f64) -> f64 {
    angle.rem_euclid(360.0)
}

/// Net rotation of an element from its writing mode and transform.
///
/// Returns `None` for an unrotated element; otherwise whole degrees in [0, 360).
pub fn rotation_degrees(transform: &str, writing_mode: &str) -> Option<u16> {
    let mut angle = match writing_mode {
        "vertical-rl" => 90.0,
        "vertical-lr" => 270.0,
        _ => 0.0,
    };

    if !transform.is_empty() && transform != "none" {
        if let Some(caps) = ROTATE_REGEX.captures(transform) {
            angle += caps[1].parse::<f64>().unwrap_or(0.0);
        } else if let Some(caps) = MATRIX_REGEX.captures(transform) {
            let values: Vec<f64> = caps[1]
                .split(',')
                .filter_map(|v| v.trim().parse::<f64>().ok())
                .collect();
            if values.len() >= 2 {
                angle += values[1].atan2(values[0]).to_degrees().round();
            }
        }
    }

    let degrees = (angle.round() as i64).rem_euclid(360);
    if degrees == 0 {
        None
    } else {
        Some(degrees as u16)
    }
}

/// Interpret a computed `box-shadow`.
///
/// Inset shadows cannot be represented and are ignored, as are shadows without at
/// least an x and y offset.
pub fn parse_box_shadow(box_shadow: &str) -> Option<Shadow> {
    if box_shadow.is_empty() || box_shadow == "none" || box_shadow.contains("inset") {
        return None;
    }

    let lengths: Vec<f64> = SHADOW_LENGTH_REGEX
        .captures_iter(box_shadow)
        .filter_map(|c| {
            let value = c[1].parse::<f64>().ok()?;
            Some(if &c[2] == "pt" { value / PT_PER_PX } else { value })
        })
        .collect();
    if lengths.len() < 2 {
        return None;
    }

    let (offset_x, offset_y) = (lengths[0], lengths[1]);
    let blur = lengths.get(2).copied().unwrap_or(0.0);

    let angle = if offset_x != 0.0 || offset_y != 0.0 {
        normalize_degrees(offset_y.atan2(offset_x).to_degrees())
    } else {
        0.0
    };

    let color = SHADOW_COLOR_REGEX.find(box_shadow).map(|m| m.as_str());
    let opacity = match color {
        Some(c) => RGBA_ALPHA_REGEX
            .captures(c)
            .and_then(|caps| caps[1].parse::<f64>().ok())
            .unwrap_or(1.0),
        None => 0.5,
    };

    Some(Shadow {
        kind: ShadowKind::Outer,
        angle: (angle.round() as u16) % 360,
        blur: px_to_pt(blur),
        color: color.map(color_to_hex).unwrap_or_else(|| "000000".to_string()),
        offset: px_to_pt(offset_x.hypot(offset_y)),
        opacity,
    })
}

/// Corner radius in inches, or `1.0` for a full ellipse.
pub fn corner_radius_in(border_radius: &str, width_px: f64, height_px: f64) -> f64 {
    let value = px_or_zero(border_radius);
    if value == 0.0 {
        return 0.0;
    }

    if border_radius.contains('%') {
        if value >= 50.0 {
            return 1.0;
        }
        return (value / 100.0) * px_to_in(width_px.min(height_px));
    }

    if border_radius.contains("pt") {
        return value / PT_PER_IN;
    }

    value / PX_PER_IN
}

/// Primary font family of a computed `font-family` list, without quotes.
pub fn primary_font_face(font_family: &str) -> String {
    font_family
        .split(',')
        .next()
        .unwrap_or("")
        .replace(['\'', '"'], "")
        .trim()
        .to_string()
}

/// Whether a computed `font-weight` renders bold.
pub fn is_bold_weight(font_weight: &str) -> bool {
    font_weight == "bold" || parse_css_number(font_weight).is_some_and(|w| w >= 600.0)
}
