//! OpenAI-compatible chat completions for the copilot sidebar.

mod client;
mod models;

pub use client::{ChatClient, ChatMessage, FALLBACK_REPLY, Role, StreamDelta, parse_stream_data};
pub use models::{ChatModel, DEFAULT_MODEL, MODELS, find_model};
