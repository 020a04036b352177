//! Offline image pipeline: cutout cleanup, mark fitting and stamp composition

pub mod cleanup;
pub mod compose;
pub mod resize;
pub mod text;

pub use cleanup::clean_mark;
pub use compose::{compose, Placement, CANVAS_HEIGHT, CANVAS_WIDTH};
pub use resize::fit_and_soften;
pub use text::{CaptionFont, InkBox, TextBlock};
