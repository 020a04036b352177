//! Output encoders
//!
//! - **PNG**: lossless output with a `pHYs` chunk carrying the print resolution

pub mod png;

pub use png::{dpi_to_ppm, encode_png, read_phys};
