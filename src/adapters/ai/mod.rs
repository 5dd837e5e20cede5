//! Text generation adapters.
//!
//! ## Available Adapters
//!
//! - `GeminiTextGenerator` - Google Gemini over the Generative Language REST API
//! - `MockTextGenerator` - Configurable mock for tests and offline runs

mod gemini_generator;
mod mock_generator;

pub use gemini_generator::{
    GeminiConfig, GeminiTextGenerator, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL,
};
pub use mock_generator::{echo_reply, MockReply, MockTextGenerator, DEFAULT_MOCK_REPLY};
