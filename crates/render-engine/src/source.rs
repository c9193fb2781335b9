//! Frame source abstraction: a decodable media handle with a single cursor.

use vidsplice_common::error::VidspliceResult;

use crate::frame::Frame;

/// Native properties of a loaded source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceMetadata {
    /// Duration in seconds.
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

/// A decodable video the export pipeline samples frames from.
///
/// A source has one decode cursor. Callers must seek in increasing time
/// order and must not share a source between concurrent exports.
#[async_trait::async_trait]
pub trait FrameSource: Send {
    /// Open the media and resolve once its metadata is readable.
    async fn load(&mut self) -> VidspliceResult<SourceMetadata>;

    /// Move the cursor to `time_ms` and resolve once the frame there is
    /// ready to read.
    async fn seek(&mut self, time_ms: f64) -> VidspliceResult<()>;

    /// The frame at the cursor.
    fn current_frame(&self) -> VidspliceResult<&Frame>;

    /// Release decoder resources. Safe to call more than once.
    async fn release(&mut self);
}
