//! reskin turns generated artwork into drop-in game sprites.
//!
//! The pipeline submits stills and clips to a queue-based generation service, extracts video
//! frames with the system `ffmpeg`, removes backgrounds, and splices frames into fixed-size
//! sprite slots so that they share the canvas, scale and foot baseline of existing art.
//!
//! # Frame alignment
//!
//! 1. **Measure**: visible bounds of the match sprite under a key color give the canvas,
//!    visible height and baseline pad ([`ReferenceMetrics`]).
//! 2. **Scale**: `match_visible_height / scale_ref_visible_height * multiplier`.
//! 3. **Place**: centered horizontally, bottom edge on the baseline, clipped or checked
//!    against a frame guide ([`OverflowMode`]).
//! 4. **Write**: staged temp file renamed over the destination.
#![forbid(unsafe_code)]

pub mod assets;
pub mod foundation;
pub mod frames;
pub mod media;
pub mod pipeline;
pub mod remote;
pub mod sprite;

pub use foundation::core::{Bounds, Canvas, Rgb};
pub use foundation::error::{ReskinError, ReskinResult};
pub use frames::apply::{ApplyReport, ApplyRequest, apply_frames};
pub use frames::select::{OutputNaming, list_frames, parse_index_spec, select_frames};
pub use pipeline::presets::GenerationPresets;
pub use remote::client::{FalClient, JobApi};
pub use remote::job::{JobHandle, JobStatus};
pub use sprite::align::FrameAligner;
pub use sprite::bounds::{KeyColor, visible_bounds};
pub use sprite::metrics::{ReferenceMetrics, scale_factor};
pub use sprite::place::{CanvasFill, OverflowMode, PlaceOptions, compose};
