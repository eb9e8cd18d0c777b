//! Prompt templates used by the response orchestrator.

/// System instruction bound to the model client when it is constructed.
pub const SYSTEM_INSTRUCTION: &str = "You are an AI assistant specialized in course materials and educational content with access to a comprehensive search tool for course information.

Search Tool Usage:
- Use the search tool **only** for questions about specific course content or detailed educational materials
- **One search per query maximum**
- Synthesize search results into accurate, fact-based responses
- If search yields no results, state this clearly without offering alternatives

Response Protocol:
- **General knowledge questions**: Answer using existing knowledge without searching
- **Course-specific questions**: Search first, then answer
- **No meta-commentary**:
 - Provide direct answers only, no reasoning process, search explanations, or question-type analysis
 - Do not mention \"based on the search results\"

All responses must be:
1. **Brief, Concise and focused** - Get to the point quickly
2. **Educational** - Maintain instructional value
3. **Clear** - Use accessible language
4. **Example-supported** - Include relevant examples when they aid understanding
Provide only the direct answer to what was asked.
";

/// Build the prompt from the query and optional flattened history.
///
/// Empty history is treated the same as no history.
pub fn compose_base_prompt(query: &str, history: Option<&str>) -> String {
    match history.filter(|h| !h.is_empty()) {
        Some(history) => format!("Previous conversation:\n{history}\n\nCurrent question: {query}"),
        None => query.to_string(),
    }
}

/// Splice search results into the prompt. History is not carried over.
pub fn compose_augmented_prompt(query: &str, search_results: &str) -> String {
    format!(
        "Question: {query}\n\nRelevant course information: {search_results}\n\nBased on the above information, provide a comprehensive answer."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_prompt_without_history_is_raw_query() {
        assert_eq!(compose_base_prompt("What is MCP?", None), "What is MCP?");
        assert_eq!(compose_base_prompt("What is MCP?", Some("")), "What is MCP?");
    }

    #[test]
    fn base_prompt_places_history_before_question() {
        let prompt = compose_base_prompt("And lesson 2?", Some("User: hi\nAssistant: hello"));
        assert_eq!(
            prompt,
            "Previous conversation:\nUser: hi\nAssistant: hello\n\nCurrent question: And lesson 2?"
        );
    }

    #[test]
    fn augmented_prompt_embeds_results() {
        let prompt = compose_augmented_prompt("Explain lesson 1", "Lesson 1 covers setup");
        assert!(prompt.starts_with("Question: Explain lesson 1\n\n"));
        assert!(prompt.contains("Relevant course information: Lesson 1 covers setup"));
        assert!(prompt.ends_with("provide a comprehensive answer."));
    }
}
