//! Size-gated lossy recompression of PDF documents.
//!
//! A job optionally runs a lossless structural pass, re-renders every page
//! to a JPEG at a quality tier's resolution, rebuilds the document with the
//! original page geometry and replaces the source only when the result is
//! strictly smaller. The original goes to the trash, never straight to
//! deletion.

pub mod config;
pub mod error;
pub mod notify;
pub mod pdf;
pub mod pipeline;
pub mod render;
pub mod replace;
