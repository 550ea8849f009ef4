//! MCP Server implementation and lifecycle management.
//!
//! The protocol engine: one instance shared by every session. Transports
//! bind it per-session and forward discovery and invocation operations to
//! it; it executes them against the tool registry and hands back structured
//! results.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/`, one file per tool.
//! The registry (`domains/tools/registry.rs`) serves the HTTP transport
//! with registry-side argument validation; the rmcp `ToolRouter`
//! (`domains/tools/router.rs`) serves the STDIO transport. Both enumerate
//! the same tools in the same order.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, handler::server::tool::ToolRouter, model::*,
    service::RequestContext, tool_handler,
};

use super::config::Config;
use crate::domains::tools::{NoteStore, ToolError, ToolRegistry, build_registry, build_tool_router};

/// Guidance reported to clients during the initialize handshake.
const INSTRUCTIONS: &str =
    "A minimal MCP server exposing arithmetic and note-taking tools over a \
     session-aware HTTP transport.";

/// The main MCP server handler.
///
/// Implements the `ServerHandler` trait from rmcp for the STDIO transport
/// and exposes registry-backed discovery/invocation for the HTTP transport.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tool registry: discovery and validated dispatch.
    registry: Arc<ToolRegistry>,

    /// Tool router for the STDIO transport.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    ///
    /// Tools are registered exactly once, here; both transports observe
    /// the same registration order.
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let notes = NoteStore::new();

        Self {
            registry: Arc::new(build_registry(notes.clone())),
            tool_router: build_tool_router::<Self>(notes),
            config,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the instructions string reported to clients.
    pub fn instructions(&self) -> &'static str {
        INSTRUCTIONS
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// List all available tools as wire-level JSON, in registration order.
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.registry
            .list()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Invoke a tool by name with raw JSON arguments.
    ///
    /// Validation happens inside the registry; the error is returned to the
    /// transport as a value, never propagated as a failure.
    pub fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let result = self.registry.invoke(name, arguments)?;
        Ok(serde_json::json!({
            "content": result.content,
            "isError": result.is_error.unwrap_or(false)
        }))
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool
/// routing over STDIO.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_server() -> McpServer {
        McpServer::new(Config::default())
    }

    #[test]
    fn test_server_identity_comes_from_config() {
        let server = test_server();
        assert_eq!(server.name(), "notes-server");
        assert_eq!(server.version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_list_tools_in_registration_order() {
        let server = test_server();
        let tools = server.list_tools();
        let names: Vec<_> = tools
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["add", "create-note", "list-notes"]);
        for tool in &tools {
            assert!(tool["inputSchema"].is_object());
        }
    }

    #[test]
    fn test_call_tool_returns_content() {
        let server = test_server();
        let result = server
            .call_tool("add", serde_json::json!({"a": 2, "b": 3}))
            .unwrap();
        assert_eq!(result["content"][0]["text"], "Result: 5");
        assert_eq!(result["isError"], false);
    }

    #[test]
    fn test_call_tool_unknown_name_fails() {
        let server = test_server();
        let err = server
            .call_tool("subtract", serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn test_clones_share_tool_state() {
        let server = test_server();
        let clone = server.clone();
        clone
            .call_tool("create-note", serde_json::json!({"content": "shared"}))
            .unwrap();

        let result = server
            .call_tool("list-notes", serde_json::json!({}))
            .unwrap();
        assert!(
            result["content"][0]["text"]
                .as_str()
                .unwrap()
                .contains("1. shared")
        );
    }
}
