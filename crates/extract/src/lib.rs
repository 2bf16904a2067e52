//! Layout extraction for rendered HTML slides.
//!
//! A [`Renderer`] produces a [`RenderedDocument`] snapshot of a slide page; [`extract`]
//! classifies every element, builds the slide model and validates it.

pub mod classify;
pub mod dom;
pub mod engine;
pub mod render;
pub mod runs;
pub mod validate;

pub use dom::{ComputedStyle, Rect, RenderedDocument, RenderedElement, RenderedNode};
pub use engine::{extract, extract_checked};
pub use render::{load_snapshot, parse_snapshot, CommandRenderer, Renderer};
