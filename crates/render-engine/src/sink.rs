//! Frame sink abstraction: a streaming encoder.

use vidsplice_common::error::VidspliceResult;

use crate::frame::Frame;

/// Encoder parameters fixed for the lifetime of one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Target video bitrate in bits per second.
    pub bitrate_bps: u64,
}

/// A finished, compressed video held in memory.
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    /// Container bytes.
    pub data: Vec<u8>,

    /// Frames the encoder accepted.
    pub frames: u64,
}

/// A streaming encoder accepting raster frames at a fixed rate.
#[async_trait::async_trait]
pub trait FrameSink: Send {
    /// Start an encoding session.
    async fn open(&mut self, settings: &EncoderSettings) -> VidspliceResult<()>;

    /// Encode one frame. Frames must match the opened dimensions.
    async fn write_frame(&mut self, frame: &Frame) -> VidspliceResult<()>;

    /// Flush the encoder and return the finished container.
    async fn finish(&mut self) -> VidspliceResult<EncodedVideo>;

    /// Tear down the session and discard anything encoded so far. Safe to
    /// call when no session is open.
    async fn abort(&mut self);
}
