//! Word matching and progress tracking.
//!
//! Provides the lexical similarity toolkit, the matching engine that advances
//! a cursor through the expected text, and the render projection.

mod engine;
pub mod render;
pub mod similarity;

pub use engine::{Engine, Hypothesis, MatchConfig, ProgressEvent};
pub use render::{WordView, render_state};
