//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the analysis core and an
//! external system (filesystem, LLM, document database).
//! Implementations live in `src/adapters/`.

pub mod filesystem;
pub mod llm;
pub mod probe;

pub use filesystem::{FileSystem, PortError};
pub use llm::{CompletionFuture, CompletionRequest, CompletionResponse, LlmClient};
pub use probe::{ConnectivityProbe, ConnectivityResult, ProbeFailure};
