//! Shared constants used across the streaming pipeline.

/// Trailing glyph appended to every interim display update to indicate that
/// the assistant is still typing. The final update omits it.
pub const CURSOR_GLYPH: char = '▌';

/// Tag pair delimiting a reasoning segment inside assistant content.
pub const REASONING_OPEN_TAG: &str = "<think>";
pub const REASONING_CLOSE_TAG: &str = "</think>";

/// Seed content for the assistant placeholder message appended before any
/// stream bytes arrive.
pub const PROCESSING_PLACEHOLDER: &str = "<think>Processing your query...</think>";

/// Shown when a failed turn carries no usable error text.
pub const GENERIC_TURN_ERROR: &str = "the request failed for an unknown reason";
