//! Chat and embedding provider abstraction.

pub mod any;
#[cfg(feature = "candle")]
pub mod candle_embed;
pub mod compatible;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod provider;

pub use any::AnyProvider;
pub use error::LlmError;
pub use provider::{LlmProvider, Message, Role};
