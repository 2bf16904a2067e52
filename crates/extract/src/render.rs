//! Access to the headless rendering collaborator.
//!
//! Rendering an HTML file and measuring it happens outside this crate. A renderer
//! hands back a [`RenderedDocument`] snapshot; the command renderer runs an external
//! program that prints the snapshot JSON on stdout.

use std::fs;
use std::path::Path;
use std::process::Command;

use deck_core::{Error, Result};
use log::{debug, warn};

use crate::dom::RenderedDocument;

/// Produces a rendered snapshot for an HTML file.
pub trait Renderer {
    fn render(&mut self, html: &Path) -> Result<RenderedDocument>;
}

/// Parse snapshot JSON.
pub fn parse_snapshot(json: &str) -> Result<RenderedDocument> {
    Ok(serde_json::from_str(json)?)
}

/// Read a snapshot JSON file.
pub fn load_snapshot(path: &Path) -> Result<RenderedDocument> {
    let content = fs::read_to_string(path)?;
    parse_snapshot(&content)
}

/// Renders by running an external command with the HTML path as its last argument.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    /// Create a renderer for `program` with no extra arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Split a command line like `node snapshot.js --width 960` on whitespace.
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| Error::RenderError("empty render command".to_string()))?;
        Ok(Self {
            program: program.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }

    /// Append an argument placed before the HTML path.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl Renderer for CommandRenderer {
    fn render(&mut self, html: &Path) -> Result<RenderedDocument> {
        debug!("Rendering {} with {}", html.display(), self.program);

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(html)
            .output()
            .map_err(|e| Error::RenderError(format!("failed to start {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Renderer exited with {}", output.status);
            return Err(Error::RenderError(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_snapshot(&stdout)
    }
}
