//! CLI tool for converting HTML slides into validated slide models.

mod pipeline;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deck_autofix::{AutoFixer, FixOptions};
use deck_core::{
    plan_scene, Diagnostics, ExtractOptions, LocalImageResolver, PageLayout, SceneOptions,
    SlideModel, ValidationIssue,
};
use deck_extract::{extract, load_snapshot, CommandRenderer};
use std::fs;
use std::path::{Path, PathBuf};

/// Convert rendered HTML slides into slide models, repairing what can be repaired.
#[derive(Parser, Debug)]
#[command(name = "html2deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a slide model from a rendered snapshot (JSON)
    Extract {
        /// Snapshot file produced by the renderer
        snapshot: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Write the model here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit the scene plan instead of the slide model
        #[arg(long)]
        scene: bool,

        /// Fail when validation reports any issue
        #[arg(long)]
        strict: bool,
    },

    /// Repair an HTML slide using a validation report
    Fix {
        /// HTML slide to repair in place
        html: PathBuf,

        /// Slide model or issue list (JSON) from a previous extraction
        #[arg(short, long)]
        report: PathBuf,

        /// Do not keep a .orig copy of the original
        #[arg(long)]
        no_backup: bool,

        /// Only fix gradients when the report mentions them
        #[arg(long)]
        no_proactive: bool,
    },

    /// Render, extract and auto-fix HTML slides
    Convert {
        /// Input HTML slide(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Command that renders an HTML file and prints its snapshot JSON
        #[arg(long)]
        render_cmd: String,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Output directory (default: same as input file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report issues without modifying the HTML
        #[arg(long)]
        no_fix: bool,

        /// Do not keep a .orig copy of fixed files
        #[arg(long)]
        no_backup: bool,

        /// Also write a scene plan per slide
        #[arg(long)]
        scene: bool,

        /// Fraction by which single-line text boxes are widened
        #[arg(long, default_value_t = 0.02)]
        widen: f64,
    },
}

#[derive(clap::Args, Debug)]
struct LayoutArgs {
    /// Page layout: 16x9, 16x10, 4x3, wide or WxH in inches
    #[arg(short, long, default_value = "16x9")]
    layout: PageLayout,

    /// Minimum distance between text and the page bottom, in pixels
    #[arg(long, default_value_t = 48.0)]
    bottom_margin: f64,
}

impl LayoutArgs {
    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions::new()
            .with_layout(self.layout)
            .with_bottom_margin_px(self.bottom_margin)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match args.command {
        Command::Extract {
            snapshot,
            layout,
            output,
            scene,
            strict,
        } => run_extract(&snapshot, &layout, output.as_deref(), scene, strict),
        Command::Fix {
            html,
            report,
            no_backup,
            no_proactive,
        } => {
            let options = FixOptions::new()
                .with_backup(!no_backup)
                .with_proactive(!no_proactive);
            run_fix(&html, &report, options)
        }
        Command::Convert {
            input,
            render_cmd,
            layout,
            output,
            no_fix,
            no_backup,
            scene,
            widen,
        } => {
            let mut renderer = CommandRenderer::from_command_line(&render_cmd)?;
            let fixer =
                (!no_fix).then(|| AutoFixer::new(FixOptions::new().with_backup(!no_backup)));
            let scene_options = scene.then(|| SceneOptions::new().with_single_line_widen(widen));
            run_convert(
                &input,
                &mut renderer,
                fixer.as_ref(),
                &layout.extract_options(),
                output.as_deref(),
                scene_options.as_ref(),
            )
        }
    }
}

fn run_extract(
    snapshot: &Path,
    layout: &LayoutArgs,
    output: Option<&Path>,
    scene: bool,
    strict: bool,
) -> Result<()> {
    let document = load_snapshot(snapshot)
        .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))?;
    let model = extract(&document, &layout.extract_options());

    let json = if scene {
        let plan = plan_scene(&model, &SceneOptions::new(), &mut LocalImageResolver);
        serde_json::to_string_pretty(&plan)?
    } else {
        serde_json::to_string_pretty(&model)?
    };

    match output {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("Failed to write {}", path.display()))?
        }
        None => println!("{}", json),
    }

    if strict && !model.is_valid() {
        return Err(deck_core::Error::Validation(Diagnostics::new(model.errors)).into());
    }
    Ok(())
}

/// Issues from a report: either a full slide model or a bare issue list.
fn read_report(path: &Path) -> Result<Vec<ValidationIssue>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let issues = if value.get("errors").is_some() {
        serde_json::from_value::<SlideModel>(value)?.errors
    } else {
        serde_json::from_value::<Diagnostics>(value)?.0
    };
    Ok(issues)
}

fn run_fix(html: &Path, report: &Path, options: FixOptions) -> Result<()> {
    let issues = read_report(report)?;
    let outcome = AutoFixer::new(options)
        .fix_file(&issues, html)
        .with_context(|| format!("Failed to fix {}", html.display()))?;

    if outcome.fixed {
        for description in &outcome.descriptions {
            println!("{}", description);
        }
    } else {
        eprintln!("No fix applies to {}", html.display());
    }
    Ok(())
}

fn run_convert(
    inputs: &[PathBuf],
    renderer: &mut CommandRenderer,
    fixer: Option<&AutoFixer>,
    options: &ExtractOptions,
    output_dir: Option<&Path>,
    scene: Option<&SceneOptions>,
) -> Result<()> {
    let mut failed = 0;

    for input_path in inputs {
        log::info!("Processing: {}", input_path.display());

        let conversion = match pipeline::convert_slide(renderer, fixer, input_path, options) {
            Ok(conversion) => conversion,
            Err(e) => {
                eprintln!("Error processing {}: {}", input_path.display(), e);
                failed += 1;
                continue;
            }
        };

        for fix in &conversion.fixes {
            eprintln!("{}: {}", input_path.display(), fix);
        }

        let model_path = pipeline::output_path(input_path, output_dir, "slide.json")?;
        pipeline::write_json(&model_path, &conversion.model)?;
        log::info!("Written to: {}", model_path.display());

        if !conversion.model.is_valid() {
            let diagnostics = Diagnostics::new(conversion.model.errors.clone());
            eprintln!("{}: {}", input_path.display(), diagnostics);
            failed += 1;
            continue;
        }

        if let Some(scene_options) = scene {
            let plan = plan_scene(&conversion.model, scene_options, &mut LocalImageResolver);
            let scene_path = pipeline::output_path(input_path, output_dir, "scene.json")?;
            pipeline::write_json(&scene_path, &plan)?;
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} slides could not be converted", failed, inputs.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "html2deck",
            "convert",
            "a.html",
            "b.html",
            "--render-cmd",
            "node snapshot.js",
            "--layout",
            "4x3",
            "--no-fix",
        ])
        .unwrap();

        match args.command {
            Command::Convert {
                input,
                render_cmd,
                layout,
                no_fix,
                ..
            } => {
                assert_eq!(input.len(), 2);
                assert_eq!(render_cmd, "node snapshot.js");
                assert_eq!(layout.layout, PageLayout::STANDARD_4X3);
                assert!(no_fix);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bad_layout_is_rejected() {
        assert!(
            Args::try_parse_from(["html2deck", "extract", "s.json", "--layout", "huge"]).is_err()
        );
    }

    #[test]
    fn test_read_report_accepts_model_or_issue_list() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("issues.json");
        fs::write(&list, r#"[{"kind": "unwrapped-text", "excerpt": "Hello"}]"#).unwrap();
        assert_eq!(
            read_report(&list).unwrap(),
            vec![ValidationIssue::UnwrappedText {
                excerpt: "Hello".into()
            }]
        );

        let model = dir.path().join("slide.json");
        let mut slide = SlideModel::new(Default::default());
        slide.errors.push(ValidationIssue::UnsupportedGradient);
        fs::write(&model, serde_json::to_string(&slide).unwrap()).unwrap();
        assert_eq!(read_report(&model).unwrap(), vec![ValidationIssue::UnsupportedGradient]);
    }
}
