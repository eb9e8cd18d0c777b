use thiserror::Error;

/// Prefix shared by every error answer handed back to callers.
pub const ERROR_ANSWER_MARKER: &str = "Error generating response";

#[derive(Debug, Error)]
pub enum CourseRagError {
    #[error("GEMINI_API_KEY is not set")]
    MissingCredential,
    #[error("invalid value {value:?} for {key}")]
    InvalidSetting { key: &'static str, value: String },
    #[error("failed to construct model client: {0}")]
    ClientInit(String),
    #[error("tool execution failed: {0}")]
    ToolExecutionFailed(String),
    #[error("{0}")]
    GenerationFailed(String),
    #[error("request was cancelled")]
    Cancelled,
}

impl CourseRagError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "CFG-1001",
            Self::InvalidSetting { .. } => "CFG-1002",
            Self::ClientInit(_) => "CFG-1003",
            Self::ToolExecutionFailed(_) => "TOOL-2001",
            Self::GenerationFailed(_) => "GEN-3001",
            Self::Cancelled => "GEN-3002",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            Self::MissingCredential => "No credential was supplied for the generative model provider.",
            Self::InvalidSetting { .. } => "A configuration value could not be parsed or is out of range.",
            Self::ClientInit(_) => "The HTTP client for the model provider could not be built.",
            Self::ToolExecutionFailed(_) => "The search tool failed; the answer was generated without course context.",
            Self::GenerationFailed(_) => "The model provider did not return an answer.",
            Self::Cancelled => "The caller cancelled the request before an answer was produced.",
        }
    }

    /// Render the error as the text answer returned in place of a model reply.
    pub fn to_answer(&self) -> String {
        format!("{ERROR_ANSWER_MARKER}: {self}")
    }
}
