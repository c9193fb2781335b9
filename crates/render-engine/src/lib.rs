//! VidSplice Render Engine
//!
//! Frame-accurate export of an edited video. The pipeline samples the
//! source on a simulated clock, drops every sample that falls inside a
//! removed part, and streams the rest through an encoder.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source ──► load metadata ──► fit output geometry ──► pick bitrate
//!                                                          │
//!   clock step t_i ──► removed? ──yes──► skip              │
//!                        │no                               ▼
//!                        └──► seek ──► compose ──► sink.write_frame
//!                                                          │
//!                                                          ▼
//!                                                 finish ──► save .webm
//! ```

pub mod compositor;
pub mod export;
pub mod ffmpeg;
pub mod frame;
pub mod quality;
pub mod sink;
pub mod skip;
pub mod source;

pub use compositor::{compose, OutputGeometry, Placement};
pub use export::*;
pub use ffmpeg::{is_ffmpeg_available, FfmpegFrameSink, FfmpegFrameSource};
pub use frame::Frame;
pub use quality::target_bitrate;
pub use sink::{EncodedVideo, EncoderSettings, FrameSink};
pub use skip::RemovedRanges;
pub use source::{FrameSource, SourceMetadata};
