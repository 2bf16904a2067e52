//! Repair strategies for validation issues.
//!
//! Each fixer is a pure function from markup to markup: it parses its own copy of the
//! document and hands back the rewritten serialization, or `None` when it changed
//! nothing.

mod gradient;
mod paint_on_text;
mod unwrapped_text;

pub use gradient::{first_color, GradientFixer};
pub use paint_on_text::PaintOnTextFixer;
pub use unwrapped_text::UnwrappedTextFixer;

use deck_core::{Result, ValidationIssue};

/// A rule-based repair.
pub trait Fixer {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// What the fixer does, reported back to the caller when it changed something.
    fn description(&self) -> &'static str;

    /// Whether this fixer applies to the issues or the markup.
    fn can_fix(&self, issues: &[ValidationIssue], markup: &str) -> bool;

    /// Rewrite `markup`. Returns `None` when nothing changed.
    fn fix(&self, issues: &[ValidationIssue], markup: &str) -> Result<Option<String>>;
}
