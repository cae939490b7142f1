//! Vidstream - WebSocket audio/video streaming server
//!
//! This library crate exposes the streaming engine for integration testing.

pub mod catalog;
pub mod config;
pub mod detector;
pub mod reader;
pub mod server;
pub mod streamer;
pub mod tokenizer;
