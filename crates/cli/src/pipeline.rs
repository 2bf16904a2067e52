//! Render → extract → fix → re-render pipeline for HTML slides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use deck_autofix::AutoFixer;
use deck_core::{ExtractOptions, SlideModel};
use deck_extract::{extract, Renderer};
use log::{info, warn};
use serde::Serialize;

/// Outcome of converting one slide.
#[derive(Debug)]
pub struct Conversion {
    /// The final slide model; check `is_valid()` before emitting it.
    pub model: SlideModel,
    /// Descriptions of the fixes that were applied.
    pub fixes: Vec<String>,
    /// Whether the slide was rendered a second time after fixing.
    pub retried: bool,
}

/// Convert one HTML slide, attempting at most one repair.
///
/// When the first extraction reports issues and a fixer is given, the file is fixed in
/// place and rendered again. The second extraction is final.
pub fn convert_slide(
    renderer: &mut dyn Renderer,
    fixer: Option<&AutoFixer>,
    html: &Path,
    options: &ExtractOptions,
) -> deck_core::Result<Conversion> {
    let document = renderer.render(html)?;
    let model = extract(&document, options);

    let unchanged = |model| Conversion {
        model,
        fixes: Vec::new(),
        retried: false,
    };

    if model.is_valid() {
        return Ok(unchanged(model));
    }
    let Some(fixer) = fixer else {
        return Ok(unchanged(model));
    };

    let outcome = fixer.fix_file(&model.errors, html)?;
    if !outcome.fixed {
        warn!("No fix applies to {}", html.display());
        return Ok(unchanged(model));
    }

    for description in &outcome.descriptions {
        info!("{}: {}", html.display(), description);
    }

    let document = renderer.render(html)?;
    Ok(Conversion {
        model: extract(&document, options),
        fixes: outcome.descriptions,
        retried: true,
    })
}

/// Path of an output file named after `input` with a new suffix.
pub fn output_path(input: &Path, output_dir: Option<&Path>, suffix: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("slide");
    let filename = format!("{}.{}", stem, suffix);

    let path = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(filename)
        }
        None => match input.parent() {
            Some(parent) => parent.join(filename),
            None => PathBuf::from(filename),
        },
    };
    Ok(path)
}

/// Write a value as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_autofix::FixOptions;
    use deck_core::ValidationIssue;
    use deck_extract::{Rect, RenderedDocument, RenderedElement};
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Hands out prepared snapshots in order.
    struct ScriptedRenderer {
        snapshots: VecDeque<RenderedDocument>,
        calls: usize,
    }

    impl ScriptedRenderer {
        fn new(snapshots: Vec<RenderedDocument>) -> Self {
            Self {
                snapshots: snapshots.into(),
                calls: 0,
            }
        }
    }

    impl Renderer for ScriptedRenderer {
        fn render(&mut self, _html: &Path) -> deck_core::Result<RenderedDocument> {
            self.calls += 1;
            self.snapshots
                .pop_front()
                .ok_or_else(|| deck_core::Error::RenderError("no snapshot left".into()))
        }
    }

    fn snapshot(content: RenderedElement) -> RenderedDocument {
        RenderedDocument {
            body: RenderedElement::new("body", Rect::new(0.0, 0.0, 960.0, 540.0))
                .with_style("width", "960px")
                .with_style("height", "540px")
                .with_child(content),
            scroll_width: 960.0,
            scroll_height: 540.0,
        }
    }

    fn bare_div() -> RenderedDocument {
        snapshot(RenderedElement::new("div", Rect::new(96.0, 96.0, 192.0, 48.0)).with_text("Hello"))
    }

    fn wrapped_div() -> RenderedDocument {
        snapshot(
            RenderedElement::new("div", Rect::new(96.0, 96.0, 192.0, 48.0)).with_child(
                RenderedElement::new("p", Rect::new(96.0, 96.0, 192.0, 48.0)).with_text("Hello"),
            ),
        )
    }

    fn slide_file(dir: &TempDir, markup: &str) -> PathBuf {
        let path = dir.path().join("slide.html");
        fs::write(&path, markup).unwrap();
        path
    }

    #[test]
    fn test_fix_and_render_once_more() {
        let dir = TempDir::new().unwrap();
        let html = slide_file(&dir, r#"<html><body><div class="content">Hello</div></body></html>"#);
        let mut renderer = ScriptedRenderer::new(vec![bare_div(), wrapped_div()]);
        let fixer = AutoFixer::new(FixOptions::new());

        let conversion =
            convert_slide(&mut renderer, Some(&fixer), &html, &ExtractOptions::new()).unwrap();

        assert!(conversion.retried);
        assert!(conversion.model.is_valid(), "{:?}", conversion.model.errors);
        assert_eq!(conversion.fixes.len(), 1);
        assert_eq!(renderer.calls, 2);
        assert!(fs::read_to_string(&html).unwrap().contains("<p>Hello</p>"));
    }

    #[test]
    fn test_clean_slide_renders_once() {
        let dir = TempDir::new().unwrap();
        let html = slide_file(&dir, "<html><body><p>Hello</p></body></html>");
        let mut renderer = ScriptedRenderer::new(vec![wrapped_div()]);
        let fixer = AutoFixer::default();

        let conversion =
            convert_slide(&mut renderer, Some(&fixer), &html, &ExtractOptions::new()).unwrap();
        assert!(!conversion.retried);
        assert_eq!(renderer.calls, 1);
    }

    #[test]
    fn test_unfixable_slide_keeps_its_issues() {
        let dir = TempDir::new().unwrap();
        let html = slide_file(&dir, "<html><body><p>Hello</p></body></html>");
        let mut overflowing = wrapped_div();
        overflowing.scroll_height = 700.0;
        let mut renderer = ScriptedRenderer::new(vec![overflowing]);
        let fixer = AutoFixer::default();

        let conversion =
            convert_slide(&mut renderer, Some(&fixer), &html, &ExtractOptions::new()).unwrap();
        assert!(!conversion.retried);
        assert!(matches!(conversion.model.errors[..], [ValidationIssue::Overflow { .. }]));
        assert!(!deck_autofix::backup_path(&html).exists());
    }

    #[test]
    fn test_without_fixer_no_retry() {
        let dir = TempDir::new().unwrap();
        let html = slide_file(&dir, r#"<div class="content">Hello</div>"#);
        let mut renderer = ScriptedRenderer::new(vec![bare_div()]);

        let conversion = convert_slide(&mut renderer, None, &html, &ExtractOptions::new()).unwrap();
        assert!(!conversion.model.is_valid());
        assert_eq!(renderer.calls, 1);
    }

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("deck/slide3.html"), None, "slide.json").unwrap();
        assert_eq!(path, PathBuf::from("deck/slide3.slide.json"));

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let path = output_path(Path::new("slide3.html"), Some(&out), "scene.json").unwrap();
        assert_eq!(path, out.join("slide3.scene.json"));
        assert!(out.is_dir());
    }
}
