//! Session-aware MCP client over HTTP.
//!
//! Speaks the server's streamable-HTTP dialect: the `initialize` handshake
//! captures the server-assigned `mcp-session-id` response header, and every
//! subsequent request echoes it. Terminating drops the session on both
//! sides.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::transport::SESSION_ID_HEADER;
use crate::core::transport::rpc::{JsonRpcRequest, JsonRpcResponse};

/// Errors that can occur in client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the request at the transport level.
    #[error("Server rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The server answered with a JSON-RPC error.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// Response did not follow the protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A session-bound operation was attempted before initialize.
    #[error("No active session; call initialize first")]
    NoSession,
}

/// Tool metadata as reported by discovery.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Session-aware MCP client.
///
/// Not `Clone`: the session belongs to exactly one client value, matching
/// the server's one-session-per-transport ownership.
pub struct McpClient {
    http: reqwest::Client,
    endpoint: String,
    session_id: Option<String>,
    next_id: u64,
}

impl McpClient {
    /// Create a client for the given JSON-RPC endpoint
    /// (e.g. `http://127.0.0.1:3000/mcp`).
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            session_id: None,
            next_id: 1,
        }
    }

    /// The session identifier assigned by the server, once initialized.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn next_request_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Perform the initialize handshake.
    ///
    /// The request carries no session marker; the server provisions a
    /// session and returns its identifier in the `mcp-session-id` header,
    /// which the client captures for all subsequent requests.
    pub async fn initialize(&mut self) -> Result<serde_json::Value, ClientError> {
        let request = JsonRpcRequest::new(
            self.next_request_id(),
            "initialize",
            Some(serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {
                    "name": "notes-client",
                    "version": env!("CARGO_PKG_VERSION")
                }
            })),
        );

        let response = self.http.post(&self.endpoint).json(&request).send().await?;

        let assigned = response
            .headers()
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let result = Self::unwrap_response(response).await?;

        self.session_id = Some(assigned.ok_or_else(|| {
            ClientError::Protocol("server did not assign a session ID".to_string())
        })?);
        info!(session_id = %self.session_id.as_deref().unwrap_or(""), "Session established");

        // Complete the handshake.
        self.notify("notifications/initialized").await?;

        Ok(result)
    }

    /// Discover the server's tools.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolInfo>, ClientError> {
        let result = self.request("tools/list", None).await?;
        let tools = result
            .get("tools")
            .cloned()
            .unwrap_or(serde_json::Value::Array(Vec::new()));
        serde_json::from_value(tools).map_err(|e| ClientError::Protocol(e.to_string()))
    }

    /// Invoke a tool by name.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        self.request(
            "tools/call",
            Some(serde_json::json!({"name": name, "arguments": arguments})),
        )
        .await
    }

    /// First text content item of a tools/call result, if any.
    pub fn result_text(result: &serde_json::Value) -> Option<&str> {
        result.get("content")?.get(0)?.get("text")?.as_str()
    }

    /// Poll the session for queued server-to-client messages.
    pub async fn poll_messages(&mut self) -> Result<Vec<serde_json::Value>, ClientError> {
        let session_id = self.session_id.clone().ok_or(ClientError::NoSession)?;

        let response = self
            .http
            .get(&self.endpoint)
            .header(SESSION_ID_HEADER, session_id.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        let messages = body
            .get("messages")
            .and_then(|m| m.as_array())
            .cloned()
            .unwrap_or_default();
        debug!("Polled {} queued message(s)", messages.len());
        Ok(messages)
    }

    /// Terminate the session.
    ///
    /// The local session identifier is cleared regardless of the server's
    /// answer: after a terminate attempt the session must not be reused.
    pub async fn terminate(&mut self) -> Result<(), ClientError> {
        let session_id = self.session_id.take().ok_or(ClientError::NoSession)?;

        let response = self
            .http
            .delete(&self.endpoint)
            .header(SESSION_ID_HEADER, session_id.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(session_id = %session_id, "Session terminated");
        Ok(())
    }

    /// Send a session-bound request and unwrap its result.
    async fn request(
        &mut self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ClientError> {
        let session_id = self.session_id.clone().ok_or(ClientError::NoSession)?;
        let request = JsonRpcRequest::new(self.next_request_id(), method, params);

        let response = self
            .http
            .post(&self.endpoint)
            .header(SESSION_ID_HEADER, session_id.as_str())
            .json(&request)
            .send()
            .await?;

        Self::unwrap_response(response).await
    }

    /// Send a session-bound notification (no result expected).
    async fn notify(&mut self, method: &str) -> Result<(), ClientError> {
        let session_id = self.session_id.clone().ok_or(ClientError::NoSession)?;
        let request = JsonRpcRequest::notification(method, None);

        let response = self
            .http
            .post(&self.endpoint)
            .header(SESSION_ID_HEADER, session_id.as_str())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    async fn unwrap_response(response: reqwest::Response) -> Result<serde_json::Value, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: JsonRpcResponse = response.json().await?;
        if let Some(error) = envelope.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(envelope.result.unwrap_or(serde_json::Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SESSION: &str = "11111111-2222-3333-4444-555555555555";

    fn rpc_result(id: u64, result: serde_json::Value) -> serde_json::Value {
        serde_json::json!({"jsonrpc": "2.0", "id": id, "result": result})
    }

    async fn mount_initialize(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .and(body_partial_json(serde_json::json!({"method": "initialize"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(SESSION_ID_HEADER, SESSION)
                    .set_body_json(rpc_result(
                        1,
                        serde_json::json!({"protocolVersion": "2024-11-05"}),
                    )),
            )
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/mcp"))
            .and(body_partial_json(
                serde_json::json!({"method": "notifications/initialized"}),
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"jsonrpc": "2.0", "result": null})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_initialize_captures_session_header() {
        let server = MockServer::start().await;
        mount_initialize(&server).await;

        let mut client = McpClient::new(format!("{}/mcp", server.uri()));
        let result = client.initialize().await.unwrap();

        assert_eq!(client.session_id(), Some(SESSION));
        assert_eq!(result["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn test_initialize_without_assigned_session_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(rpc_result(1, serde_json::json!({}))),
            )
            .mount(&server)
            .await;

        let mut client = McpClient::new(format!("{}/mcp", server.uri()));
        let err = client.initialize().await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
        assert_eq!(client.session_id(), None);
    }

    #[tokio::test]
    async fn test_requests_echo_session_header() {
        let server = MockServer::start().await;
        mount_initialize(&server).await;

        Mock::given(method("POST"))
            .and(path("/mcp"))
            .and(header(SESSION_ID_HEADER, SESSION))
            .and(body_partial_json(serde_json::json!({"method": "tools/list"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(rpc_result(
                2,
                serde_json::json!({"tools": [
                    {"name": "add", "description": "Adds two numbers together", "inputSchema": {}}
                ]}),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = McpClient::new(format!("{}/mcp", server.uri()));
        client.initialize().await.unwrap();

        let tools = client.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "add");
    }

    #[tokio::test]
    async fn test_session_bound_call_before_initialize_fails() {
        let mut client = McpClient::new("http://127.0.0.1:9/mcp");
        let err = client
            .call_tool("add", serde_json::json!({"a": 1, "b": 2}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NoSession));
    }

    #[tokio::test]
    async fn test_terminate_sends_delete_and_clears_session() {
        let server = MockServer::start().await;
        mount_initialize(&server).await;

        Mock::given(method("DELETE"))
            .and(path("/mcp"))
            .and(header(SESSION_ID_HEADER, SESSION))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = McpClient::new(format!("{}/mcp", server.uri()));
        client.initialize().await.unwrap();
        client.terminate().await.unwrap();

        assert_eq!(client.session_id(), None);
    }

    #[tokio::test]
    async fn test_rpc_error_surfaces_as_client_error() {
        let server = MockServer::start().await;
        mount_initialize(&server).await;

        Mock::given(method("POST"))
            .and(path("/mcp"))
            .and(body_partial_json(serde_json::json!({"method": "tools/call"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 2,
                "error": {"code": -32602, "message": "Tool not found: subtract"}
            })))
            .mount(&server)
            .await;

        let mut client = McpClient::new(format!("{}/mcp", server.uri()));
        client.initialize().await.unwrap();

        let err = client
            .call_tool("subtract", serde_json::json!({}))
            .await
            .unwrap_err();
        match err {
            ClientError::Rpc { code, message } => {
                assert_eq!(code, -32602);
                assert!(message.contains("Tool not found"));
            }
            other => panic!("Expected Rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_rejection_surfaces_status_and_body() {
        let server = MockServer::start().await;
        mount_initialize(&server).await;

        Mock::given(method("GET"))
            .and(path("/mcp"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("Invalid or missing session ID"),
            )
            .mount(&server)
            .await;

        let mut client = McpClient::new(format!("{}/mcp", server.uri()));
        client.initialize().await.unwrap();

        let err = client.poll_messages().await.unwrap_err();
        match err {
            ClientError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "Invalid or missing session ID");
            }
            other => panic!("Expected Rejected error, got {other:?}"),
        }
    }

    #[test]
    fn test_result_text_extracts_first_content_item() {
        let result = serde_json::json!({
            "content": [{"type": "text", "text": "Result: 5"}],
            "isError": false
        });
        assert_eq!(McpClient::result_text(&result), Some("Result: 5"));
        assert_eq!(McpClient::result_text(&serde_json::json!({})), None);
    }
}
