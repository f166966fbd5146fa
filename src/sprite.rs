//! Per-image transforms: keying, measuring, scaling and placing sprites on a fixed canvas.

pub mod align;
pub mod bounds;
pub mod frame;
pub mod keying;
pub mod metrics;
pub mod place;
