use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Name of the single tool the orchestrator knows how to invoke.
pub const SEARCH_TOOL_NAME: &str = "search_course_content";

/// Keyword arguments passed to a tool.
pub type ToolArguments = Map<String, Value>;

/// Describes a tool advertised to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Definition of the course content search tool.
    pub fn search_course_content() -> Self {
        Self {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

/// Capability that runs a named tool and returns its textual result.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, tool_name: &str, arguments: &ToolArguments) -> Result<String>;
}

/// Arguments for the search tool: the raw query and nothing else.
pub fn search_arguments(query: &str) -> ToolArguments {
    let mut arguments = Map::new();
    arguments.insert("query".to_string(), Value::String(query.to_string()));
    arguments
}
