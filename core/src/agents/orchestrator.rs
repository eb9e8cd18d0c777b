use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::Level;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::gemini::{GeminiClient, GenerationConfig, GenerativeModel};
use super::prompt::{compose_augmented_prompt, compose_base_prompt, SYSTEM_INSTRUCTION};
use super::retrieval::{KeywordTriggerPolicy, RetrievalPolicy};
use super::tools::{search_arguments, ToolDescriptor, ToolExecutor, SEARCH_TOOL_NAME};
use crate::config::Settings;
use crate::errors::CourseRagError;
use crate::logging::log_event;

/// Turns a user question into an answer, optionally grounded by one search
/// call. Holds no per-request state, so one instance can serve concurrent
/// callers.
pub struct ResponseOrchestrator {
    settings: Arc<Settings>,
    model: Arc<dyn GenerativeModel>,
    policy: Arc<dyn RetrievalPolicy>,
}

enum Bounded<T> {
    Completed(T),
    TimedOut,
    Cancelled,
}

impl ResponseOrchestrator {
    /// Build an orchestrator backed by the Gemini client.
    pub fn new(settings: Arc<Settings>) -> Result<Self, CourseRagError> {
        let model = GeminiClient::new(&settings, SYSTEM_INSTRUCTION)?;
        Ok(Self::with_model(settings, Arc::new(model)))
    }

    /// Build an orchestrator around any generation backend. The retrieval
    /// policy defaults to keyword matching over the configured vocabulary.
    pub fn with_model(settings: Arc<Settings>, model: Arc<dyn GenerativeModel>) -> Self {
        let policy = Arc::new(KeywordTriggerPolicy::new(settings.trigger_terms()));
        Self {
            settings,
            model,
            policy,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn RetrievalPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::deterministic(self.settings.max_output_tokens())
    }

    /// Answer `query`. Never fails: provider problems come back as a string
    /// starting with [`crate::errors::ERROR_ANSWER_MARKER`].
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        tools: Option<&[ToolDescriptor]>,
        executor: Option<&dyn ToolExecutor>,
    ) -> String {
        self.generate_with_cancel(query, history, tools, executor, &CancellationToken::new())
            .await
    }

    /// Same as [`generate`](Self::generate), but both outbound calls are
    /// abandoned as soon as `cancel` fires.
    pub async fn generate_with_cancel(
        &self,
        query: &str,
        history: Option<&str>,
        tools: Option<&[ToolDescriptor]>,
        executor: Option<&dyn ToolExecutor>,
        cancel: &CancellationToken,
    ) -> String {
        match self.answer(query, history, tools, executor, cancel).await {
            Ok(answer) => answer,
            Err(err) => {
                log_event(
                    Level::Warn,
                    Some(err.code()),
                    "rag.generation",
                    "Answer generation failed",
                    Some(err.explain()),
                    Some(json!({ "error": err.to_string() })),
                );
                err.to_answer()
            }
        }
    }

    async fn answer(
        &self,
        query: &str,
        history: Option<&str>,
        tools: Option<&[ToolDescriptor]>,
        executor: Option<&dyn ToolExecutor>,
        cancel: &CancellationToken,
    ) -> Result<String, CourseRagError> {
        let base_prompt = compose_base_prompt(query, history);

        let executor = match (tools, executor) {
            (Some(tools), Some(executor)) if !tools.is_empty() => Some(executor),
            _ => None,
        };

        let prompt = match executor {
            Some(executor) if self.policy.needs_retrieval(query) => {
                match self.retrieve(executor, query, cancel).await {
                    Ok(results) => compose_augmented_prompt(query, &results),
                    Err(CourseRagError::Cancelled) => return Err(CourseRagError::Cancelled),
                    Err(err) => {
                        log_event(
                            Level::Warn,
                            Some(err.code()),
                            "rag.retrieval",
                            "Search failed, answering without course context",
                            Some(err.explain()),
                            Some(json!({ "error": err.to_string() })),
                        );
                        base_prompt
                    }
                }
            }
            Some(_) => {
                log_event(
                    Level::Debug,
                    None,
                    "rag.retrieval",
                    "Search skipped, query matched no trigger term",
                    None,
                    None,
                );
                base_prompt
            }
            None => base_prompt,
        };

        self.invoke_model(&prompt, cancel).await
    }

    async fn retrieve(
        &self,
        executor: &dyn ToolExecutor,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<String, CourseRagError> {
        let arguments = search_arguments(query);
        let limit = self.settings.tool_timeout();
        log_event(
            Level::Debug,
            None,
            "rag.retrieval",
            "Search triggered",
            None,
            Some(json!({ "tool": SEARCH_TOOL_NAME, "timeout_ms": limit.as_millis() as u64 })),
        );
        match run_bounded(executor.execute(SEARCH_TOOL_NAME, &arguments), limit, cancel).await {
            Bounded::Completed(Ok(results)) => Ok(results),
            Bounded::Completed(Err(err)) => {
                Err(CourseRagError::ToolExecutionFailed(format!("{err:#}")))
            }
            Bounded::TimedOut => Err(CourseRagError::ToolExecutionFailed(format!(
                "timed out after {}ms",
                limit.as_millis()
            ))),
            Bounded::Cancelled => Err(CourseRagError::Cancelled),
        }
    }

    async fn invoke_model(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, CourseRagError> {
        let config = self.generation_config();
        let limit = self.settings.generation_timeout();
        match run_bounded(self.model.generate(prompt, &config), limit, cancel).await {
            Bounded::Completed(Ok(text)) if text.trim().is_empty() => Err(
                CourseRagError::GenerationFailed("model returned an empty response".to_string()),
            ),
            Bounded::Completed(Ok(text)) => {
                let preview = text.chars().take(200).collect::<String>();
                log_event(
                    Level::Info,
                    None,
                    "rag.generation",
                    "Answer generated",
                    None,
                    Some(json!({ "preview": preview })),
                );
                Ok(text)
            }
            Bounded::Completed(Err(err)) => Err(CourseRagError::GenerationFailed(format!("{err:#}"))),
            Bounded::TimedOut => Err(CourseRagError::GenerationFailed(format!(
                "model call timed out after {}ms",
                limit.as_millis()
            ))),
            Bounded::Cancelled => Err(CourseRagError::Cancelled),
        }
    }
}

async fn run_bounded<F>(future: F, limit: Duration, cancel: &CancellationToken) -> Bounded<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Bounded::Cancelled,
        outcome = tokio::time::timeout(limit, future) => match outcome {
            Ok(value) => Bounded::Completed(value),
            Err(_) => Bounded::TimedOut,
        },
    }
}
