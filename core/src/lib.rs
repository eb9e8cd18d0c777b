//! Core library for the course assistant: turns a user question into an
//! answer, grounding it with course search results when the question looks
//! course-specific.
//!
//! - [`config`] resolves the immutable process settings.
//! - [`agents`] holds the response orchestrator, its prompt templates, the
//!   retrieval-trigger policy, the tool capability and the Gemini client.
//! - [`errors`] keeps the error catalogue with codes and human explanations.
//! - [`logging`] emits structured diagnostics through the `log` facade.

pub mod agents;
pub mod config;
pub mod errors;
pub mod logging;

pub use agents::ResponseOrchestrator;
pub use config::Settings;
pub use errors::CourseRagError;
