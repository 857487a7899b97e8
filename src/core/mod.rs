//! Core assistant components
//!
//! Turn orchestration, response block extraction, and attached-file
//! sampling.

pub mod chat;
pub mod extract;
pub mod sample;

pub use chat::{AttachedFile, ChatEngine, ChatError, ChatRequest, TurnResult};
pub use extract::{BlockScheme, ExtractedBlocks};
