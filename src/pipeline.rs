//! Multi-step workflows built on the sprite, media and remote layers.

pub mod anchor;
pub mod batch;
pub mod config;
pub mod generate;
pub mod presets;
pub mod task;
