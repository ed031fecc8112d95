//! **pbkit** bundles the helpers of a pastebin service: content negotiated
//! responses, paste URLs, syntax highlighting, request body extraction and
//! markup rendering.
#![warn(missing_docs, clippy::unwrap_used)]

/// Configuration file parser.
pub mod config;

/// Server routes.
pub mod server;

/// HTTP headers.
pub mod header;

/// Error types.
pub mod error;

/// Per-request context.
pub mod context;

/// Request body extraction.
pub mod content;

/// Content negotiated responses.
pub mod response;

/// Paste records.
pub mod paste;

/// Paste URLs and descriptors.
pub mod resolve;

/// Short identifiers.
pub mod sid;

/// Syntax highlighting.
pub mod highlight;

/// Markup rendering.
pub mod markup;

/// Page templates.
pub mod template;

/// Helper functions.
pub mod util;
