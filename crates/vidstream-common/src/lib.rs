//! Vidstream-Common: Shared types and errors.
//!
//! This crate provides common functionality used across vidstream:
//!
//! - **Typed IDs**: 12-byte hex identifiers for videos and users
//! - **Core Types**: The video aggregate and the resource it points at
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use vidstream_common::{Error, Result, VideoId};
//!
//! let id: VideoId = "507f1f77bcf86cd799439011".parse().unwrap();
//! assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("video"))
//! }
//! # assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
