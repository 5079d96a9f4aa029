//! Typed building blocks for the Gemini generateContent API.
//!
//! The module contains the validated generation settings, multimodal
//! prompt normalization, conversation state, and the blocking HTTP
//! client used by CLI commands.

/// Conversation turns and chat session state.
pub mod chat;
/// Client context, credential resolution, and the blocking HTTP backend.
pub mod client;
/// Image decode and vector rasterization helpers.
pub mod codec;
/// Prompt content items and assembled prompts.
pub mod content;
/// Error taxonomy shared across the crate.
pub mod error;
/// Synchronous remote content fetching.
pub mod fetch;
/// Provider model catalog.
pub mod models;
/// Argument classification into prompt content.
pub mod normalize;
/// Generation settings and safety policy.
pub mod settings;
/// Request/response wire format.
pub mod wire;
