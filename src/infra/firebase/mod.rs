//! Realtime Database access over its REST interface.

mod client;
mod stream;

pub use client::FirebaseClient;
pub use stream::{StreamMessage, apply_patch, apply_put};
