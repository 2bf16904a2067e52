//! The fix engine: runs every applicable fixer in order over progressively updated markup.

use std::fs;
use std::path::{Path, PathBuf};

use deck_core::{Result, ValidationIssue};
use log::{debug, info};

use crate::fixers::{Fixer, GradientFixer, PaintOnTextFixer, UnwrappedTextFixer};

/// Settings for the fix engine.
#[derive(Debug, Clone)]
pub struct FixOptions {
    /// Keep a one-time `<name>.orig` copy of the file before its first rewrite.
    pub backup: bool,
    /// Fix gradient and background-image markup even when no issue reported it.
    pub proactive: bool,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            backup: true,
            proactive: true,
        }
    }
}

impl FixOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_proactive(mut self, proactive: bool) -> Self {
        self.proactive = proactive;
        self
    }
}

/// Result of one fix pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FixOutcome {
    /// Whether at least one fixer changed the markup.
    pub fixed: bool,
    /// Descriptions of the fixers that changed something, in the order they ran.
    pub descriptions: Vec<String>,
    /// The resulting markup; the input unchanged when nothing was fixed.
    pub markup: String,
}

/// Applies the fixers in a fixed order: paint on text, unwrapped text, gradients.
pub struct AutoFixer {
    options: FixOptions,
    fixers: Vec<Box<dyn Fixer>>,
}

impl AutoFixer {
    pub fn new(options: FixOptions) -> Self {
        let fixers: Vec<Box<dyn Fixer>> = vec![
            Box::new(PaintOnTextFixer),
            Box::new(UnwrappedTextFixer),
            Box::new(GradientFixer::new(options.proactive)),
        ];
        Self { options, fixers }
    }

    pub fn options(&self) -> &FixOptions {
        &self.options
    }

    /// Run every applicable fixer, each on the output of the previous one.
    pub fn fix_markup(&self, issues: &[ValidationIssue], markup: &str) -> Result<FixOutcome> {
        let mut current = markup.to_string();
        let mut descriptions = Vec::new();

        for fixer in &self.fixers {
            if !fixer.can_fix(issues, &current) {
                debug!("Fixer {} does not apply", fixer.name());
                continue;
            }

            match fixer.fix(issues, &current)? {
                Some(next) => {
                    info!("Applied fixer {}", fixer.name());
                    descriptions.push(fixer.description().to_string());
                    current = next;
                }
                None => debug!("Fixer {} matched but changed nothing", fixer.name()),
            }
        }

        Ok(FixOutcome {
            fixed: !descriptions.is_empty(),
            descriptions,
            markup: current,
        })
    }

    /// Fix a file in place. The file is only rewritten when something changed.
    pub fn fix_file(&self, issues: &[ValidationIssue], path: &Path) -> Result<FixOutcome> {
        let original = fs::read_to_string(path)?;
        let outcome = self.fix_markup(issues, &original)?;

        if outcome.fixed {
            if self.options.backup {
                let backup = backup_path(path);
                if !backup.exists() {
                    fs::write(&backup, &original)?;
                    info!("Saved original to {}", backup.display());
                }
            }
            fs::write(path, &outcome.markup)?;
            info!("Rewrote {}", path.display());
        }

        Ok(outcome)
    }
}

impl Default for AutoFixer {
    fn default() -> Self {
        Self::new(FixOptions::default())
    }
}

/// `<name>.orig` next to `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".orig");
    path.with_file_name(name)
}
