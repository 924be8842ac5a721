//! Generative service implementations.

pub mod gemini;
pub mod shared;

pub use gemini::{GeminiClient, GeminiConfig};
