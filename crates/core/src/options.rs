//! Extraction settings and target page layouts.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Size of the target presentation page, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub width_in: f64,
    pub height_in: f64,
}

impl PageLayout {
    /// 16:9, 10 × 5.625 in.
    pub const WIDESCREEN_16X9: PageLayout = PageLayout::new(10.0, 5.625);
    /// 16:10, 10 × 6.25 in.
    pub const WIDESCREEN_16X10: PageLayout = PageLayout::new(10.0, 6.25);
    /// 4:3, 10 × 7.5 in.
    pub const STANDARD_4X3: PageLayout = PageLayout::new(10.0, 7.5);
    /// 13.333 × 7.5 in.
    pub const WIDE: PageLayout = PageLayout::new(13.333, 7.5);

    pub const fn new(width_in: f64, height_in: f64) -> Self {
        Self {
            width_in,
            height_in,
        }
    }

    /// Build a layout from a size in EMU (914400 per inch).
    pub fn from_emu(width: u64, height: u64) -> Self {
        const EMU_PER_IN: f64 = 914_400.0;
        Self::new(width as f64 / EMU_PER_IN, height as f64 / EMU_PER_IN)
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::WIDESCREEN_16X9
    }
}

impl fmt::Display for PageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}in", self.width_in, self.height_in)
    }
}

impl FromStr for PageLayout {
    type Err = Error;

    /// Accepts `16x9`, `16x10`, `4x3`, `wide`, or explicit inches like `10x5.625`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "16x9" | "16:9" => Ok(Self::WIDESCREEN_16X9),
            "16x10" | "16:10" => Ok(Self::WIDESCREEN_16X10),
            "4x3" | "4:3" => Ok(Self::STANDARD_4X3),
            "wide" => Ok(Self::WIDE),
            other => {
                let (w, h) = other
                    .trim_end_matches("in")
                    .split_once('x')
                    .ok_or_else(|| Error::InvalidLayout(s.to_string()))?;
                let width_in: f64 = w
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidLayout(s.to_string()))?;
                let height_in: f64 = h
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidLayout(s.to_string()))?;
                if width_in <= 0.0 || height_in <= 0.0 {
                    return Err(Error::InvalidLayout(s.to_string()));
                }
                Ok(Self::new(width_in, height_in))
            }
        }
    }
}

/// Glyphs that count as a typed bullet at the start of text.
pub const DEFAULT_BULLET_GLYPHS: &[char] = &[
    '•', '-', '*', '▪', '▸', '○', '●', '◆', '◇', '■', '□',
];

/// Settings for layout extraction and validation.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Page size the document must match.
    pub layout: PageLayout,
    /// Minimum distance between a text box and the page bottom, in pixels.
    pub bottom_margin_px: f64,
    /// Text at or below this size (pt) may sit inside the bottom margin.
    pub margin_check_min_font_pt: f64,
    /// Scroll overflow tolerated before reporting, in pixels.
    pub overflow_tolerance_px: f64,
    /// Allowed difference between document and page size, in inches.
    pub layout_tolerance_in: f64,
    /// Font families that only ship one weight and must never be synthetically bolded.
    pub single_weight_fonts: Vec<String>,
    /// Glyphs recognised as typed bullets.
    pub bullet_glyphs: Vec<char>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            layout: PageLayout::default(),
            bottom_margin_px: 48.0,
            margin_check_min_font_pt: 12.0,
            overflow_tolerance_px: 1.0,
            layout_tolerance_in: 0.1,
            single_weight_fonts: vec!["impact".to_string()],
            bullet_glyphs: DEFAULT_BULLET_GLYPHS.to_vec(),
        }
    }
}

impl ExtractOptions {
    /// Create options with the default 16:9 layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page layout.
    pub fn with_layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the bottom margin that text boxes must keep, in pixels.
    pub fn with_bottom_margin_px(mut self, px: f64) -> Self {
        self.bottom_margin_px = px.max(0.0);
        self
    }

    /// Add a font family that must not receive synthetic bold.
    pub fn with_single_weight_font(mut self, family: impl Into<String>) -> Self {
        self.single_weight_fonts.push(family.into().to_lowercase());
        self
    }

    /// Whether bold must be suppressed for the given computed `font-family`.
    pub fn skips_bold(&self, font_family: &str) -> bool {
        let primary = crate::units::primary_font_face(font_family).to_lowercase();
        !primary.is_empty() && self.single_weight_fonts.iter().any(|f| *f == primary)
    }

    /// Whether `c` is a bullet glyph.
    pub fn is_bullet_glyph(&self, c: char) -> bool {
        self.bullet_glyphs.contains(&c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_presets() {
        assert_eq!("16x9".parse::<PageLayout>().unwrap(), PageLayout::WIDESCREEN_16X9);
        assert_eq!("4:3".parse::<PageLayout>().unwrap(), PageLayout::STANDARD_4X3);
        assert_eq!("WIDE".parse::<PageLayout>().unwrap(), PageLayout::WIDE);
    }

    #[test]
    fn test_layout_explicit_inches() {
        let layout: PageLayout = "13.333x7.5in".parse().unwrap();
        assert_eq!(layout, PageLayout::new(13.333, 7.5));
        assert!("abc".parse::<PageLayout>().is_err());
        assert!("0x5".parse::<PageLayout>().is_err());
    }

    #[test]
    fn test_layout_from_emu() {
        let layout = PageLayout::from_emu(9_144_000, 5_143_500);
        assert!((layout.width_in - 10.0).abs() < 1e-9);
        assert!((layout.height_in - 5.625).abs() < 1e-9);
    }

    #[test]
    fn test_skips_bold_for_single_weight_fonts() {
        let options = ExtractOptions::new();
        assert!(options.skips_bold("Impact, sans-serif"));
        assert!(options.skips_bold("'impact'"));
        assert!(!options.skips_bold("Arial"));

        let options = options.with_single_weight_font("Bebas Neue");
        assert!(options.skips_bold("\"Bebas Neue\", Arial"));
    }
}
