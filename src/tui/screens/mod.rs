//! TUI screen drawing.

pub(crate) mod dashboard;
