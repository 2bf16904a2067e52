//! Rule-based repair of HTML slides that fail layout validation.
//!
//! [`AutoFixer`] takes the issues reported by extraction and the slide markup, runs each
//! applicable fixer on the output of the previous one and optionally persists the result.

pub mod css;
pub mod engine;
pub mod fixers;
pub mod markup;

pub use engine::{backup_path, AutoFixer, FixOptions, FixOutcome};
pub use fixers::{Fixer, GradientFixer, PaintOnTextFixer, UnwrappedTextFixer};
