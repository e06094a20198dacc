//! PowerPoint (.pptx) presentations.
//!
//! Slides, masters and layouts are carried through unchanged. The theme is
//! the one used by the first slide master.

pub mod package;

pub use package::PowerPoint;
