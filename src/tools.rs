// Agent tool catalog.
// MCP-style tool definitions describing the listing operations to AI agents.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A tool an agent can call, with a JSON Schema for its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

pub fn agent_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "list_pull_requests".to_string(),
            description: "Fetch open pull requests for a specific GitHub repository. \
                          Use this to get the status of PRs."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "repository": {
                        "type": "string",
                        "description": "The repository name in 'owner/name' format (e.g., 'vercel/next.js')."
                    },
                    "max_pages": {
                        "type": "integer",
                        "description": "Maximum number of pages to fetch (default: 3).",
                        "default": 3
                    },
                    "bypass_cache": {
                        "type": "boolean",
                        "description": "Set to true to force a fresh fetch from GitHub.",
                        "default": false
                    }
                },
                "required": ["repository"]
            }),
        },
        ToolDefinition {
            name: "list_user_repositories".to_string(),
            description: "List repositories that the authenticated user has access to. \
                          Requires a token."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}
