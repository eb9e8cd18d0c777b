//! Decides whether a query should be grounded with course search results.
//!
//! The configured provider has no structured tool-calling protocol, so the
//! decision is a lexical classification of the query. It sits behind
//! [`RetrievalPolicy`] so a model-driven decision can replace it later.

/// Vocabulary used when `RETRIEVAL_TRIGGER_TERMS` is not configured.
pub const DEFAULT_TRIGGER_TERMS: &[&str] = &[
    "course",
    "lesson",
    "outline",
    "chatbot",
    "RAG",
    "MCP",
    "available",
    "curriculum",
    "topics",
    "explain",
];

pub trait RetrievalPolicy: Send + Sync {
    /// Return `true` when the query should be answered with search context.
    fn needs_retrieval(&self, query: &str) -> bool;
}

/// Case-insensitive substring match against a fixed vocabulary.
///
/// Substring semantics mean "courses" fires on "course" and short terms such
/// as "rag" also fire inside unrelated words ("storage").
#[derive(Debug, Clone)]
pub struct KeywordTriggerPolicy {
    terms: Vec<String>,
}

impl KeywordTriggerPolicy {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|term| term.as_ref().trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// First vocabulary term found in the query, if any.
    pub fn matched_term(&self, query: &str) -> Option<&str> {
        let query = query.to_lowercase();
        self.terms
            .iter()
            .find(|term| query.contains(term.as_str()))
            .map(String::as_str)
    }
}

impl Default for KeywordTriggerPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_TERMS)
    }
}

impl RetrievalPolicy for KeywordTriggerPolicy {
    fn needs_retrieval(&self, query: &str) -> bool {
        self.matched_term(query).is_some()
    }
}
