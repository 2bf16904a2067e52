//! Core domain types, unit conversions, validation issues and scene planning
//! for converting rendered HTML slides into presentation slides.

pub mod error;
pub mod issues;
pub mod options;
pub mod scene;
pub mod types;
pub mod units;

pub use error::{Error, Result};
pub use issues::{Diagnostics, TextPaint, ValidationIssue};
pub use options::{ExtractOptions, PageLayout};
pub use scene::{plan_scene, ImageResolver, LocalImageResolver, SceneOptions, ScenePlan};
pub use types::{
    Align, Background, Element, Placeholder, Position, Run, RunOptions, SlideModel, TextContent,
    TextTag,
};
