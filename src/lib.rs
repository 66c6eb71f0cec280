//! Animated 5x5 grids whose cell proportions and colours are driven by
//! per-motion weight functions.

pub mod color;
pub mod driver;
pub mod encoding;
pub mod error_codes;
pub mod grid;
pub mod manifest;
pub mod math;
pub mod motion;
pub mod raster;
pub mod render;
pub mod schema;
pub mod weights;
