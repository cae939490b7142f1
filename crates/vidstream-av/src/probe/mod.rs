//! Media file probing module.
//!
//! The streaming protocol only needs the codec tag of the first audio stream
//! and of the first video stream, so probing stops at stream-level data.

mod ffprobe;
mod types;

pub use ffprobe::probe_with_ffprobe;
pub use types::*;
