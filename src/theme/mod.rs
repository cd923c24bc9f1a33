//! Shared colors for text and overlays.

pub mod palette;
