//! CLI command implementations.

/// Single-shot ask command.
pub mod ask;
/// Interactive chat loop over stdin.
pub mod chat;
/// Config inspection helpers.
pub mod config;
/// Provider catalog listing.
pub mod models;
