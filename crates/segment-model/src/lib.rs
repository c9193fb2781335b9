//! VidSplice Segment Model
//!
//! Defines how a single video is split and trimmed:
//! - **Intervals:** half-open `[start, end)` spans of source time in seconds
//! - **Timeline:** the partition of `[0, length)` into parts, plus tombstones
//!   for parts marked removed and an exclusive selection
//! - **Commands:** a pure `(state, command) -> (state, signals)` transition
//! - **Project:** the JSON file an edit session is persisted to
//!
//! This crate performs no media I/O; the render engine consumes its removed
//! parts.

pub mod command;
pub mod interval;
pub mod project;
pub mod timeline;

pub use command::*;
pub use interval::*;
pub use project::*;
pub use timeline::*;
