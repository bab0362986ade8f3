//! Structured extraction for the procurement workflow.
//!
//! A language model turns free text into typed records: the structure of an
//! RFP, the terms of a vendor proposal, and a narrative ranking of proposals.
//!
//! # Backends
//!
//! The backend is chosen once at startup from configuration:
//! - `Model` - an OpenAI-compatible chat-completions endpoint (`openai` module)
//! - `Mock` - deterministic canned output when no credentials are configured
//!
//! # Time bounds
//!
//! Every model call runs under a fixed budget. RFP extraction and comparison
//! degrade to fallback values when the budget is exceeded or the call fails;
//! proposal analysis reports the failure so the caller can skip the message.

pub mod backend;
pub mod llm;
pub mod openai;
pub mod prompts;
pub mod service;

pub use backend::ExtractionBackend;
pub use llm::{ChatRequest, LlmClient, LlmError};
pub use openai::OpenAiCompatibleClient;
pub use service::ExtractionService;
