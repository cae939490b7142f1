//! # vidstream-av
//!
//! Media probing helpers for the streaming server.
//!
//! This crate provides functionality for:
//! - Probing media files with ffprobe to find the first audio and video
//!   streams and their codec tags
//! - Detecting the external tools the server depends on
//!
//! ## Example
//!
//! ```no_run
//! use vidstream_av::probe;
//!
//! let info = probe("/path/to/video.mp4")?;
//! println!("start:{}:{}", info.audio_tag(), info.video_tag());
//! # Ok::<(), vidstream_av::Error>(())
//! ```

mod error;
pub mod probe;
pub mod tools;

// Re-exports
pub use error::{Error, Result};
pub use probe::{StreamInfo, StreamKind, StreamsInfo};
pub use tools::{check_tool, check_tools, locate_ffprobe, ToolInfo, FFPROBE};

/// Probe a media file with the `ffprobe` found on `PATH`.
pub fn probe<P: AsRef<std::path::Path>>(path: P) -> Result<StreamsInfo> {
    probe::probe_with_ffprobe(std::path::Path::new(FFPROBE), path.as_ref())
}
