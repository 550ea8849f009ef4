//! HTTP transport implementation.
//!
//! Streamable-HTTP style transport: JSON-RPC over POST with session
//! affinity carried in the `mcp-session-id` header. A request without a
//! recognized session may only be the `initialize` handshake, which
//! provisions a session and returns its identifier in the response header.
//! GET polls the session's outbound message queue, DELETE terminates the
//! session and removes it from the store.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, instrument, warn};

use super::rpc::{JsonRpcRequest, JsonRpcResponse};
use super::session::{Session, SessionStore};
use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;

/// Typed form of [`super::SESSION_ID_HEADER`] for axum/tower-http.
const SESSION_HEADER: HeaderName = HeaderName::from_static(super::SESSION_ID_HEADER);

/// How often the idle-session sweeper runs.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance, shared by every session.
    server: McpServer,
    /// Owned mapping from session identifier to live session.
    sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(server: McpServer) -> Self {
        Self {
            server,
            sessions: Arc::new(SessionStore::new()),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();

        let state = AppState::new(server);
        self.spawn_session_sweeper(&state);

        let app = build_router(state, &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (session-aware JSON-RPC over HTTP, CORS {})",
            addr, cors_status
        );
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → Poll:     GET {}", self.config.rpc_path);
        info!("  → End:      DELETE {}", self.config.rpc_path);
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }

    /// Periodically reclaim sessions whose clients vanished without
    /// sending DELETE. Without this the store grows without bound.
    fn spawn_session_sweeper(&self, state: &AppState) {
        if self.config.session_idle_secs == 0 {
            return;
        }

        let sessions = state.sessions.clone();
        let max_idle = Duration::from_secs(self.config.session_idle_secs);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(SESSION_SWEEP_INTERVAL);
            loop {
                tick.tick().await;
                let removed = sessions.remove_idle(max_idle).await;
                if removed > 0 {
                    info!("Expired {} idle session(s)", removed);
                }
            }
        });
    }
}

/// Build the axum router for the HTTP transport.
pub fn build_router(state: AppState, config: &HttpConfig) -> Router {
    let mut app = Router::new()
        .route(
            &config.rpc_path,
            post(handle_post).get(handle_get).delete(handle_delete),
        )
        .route("/health", get(health_check))
        .route("/", get(root_handler))
        .with_state(state);

    // CORS: any origin, but only the protocol headers in either direction.
    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([header::CONTENT_TYPE, SESSION_HEADER])
            .expose_headers([SESSION_HEADER]);
        app = app.layer(cors);
    }

    app
}

/// Root handler - provides API info.
async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Notes MCP Server",
        "version": env!("CARGO_PKG_VERSION"),
        "transport": "HTTP (session-aware)",
        "endpoints": {
            "rpc": "/mcp",
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0",
        "documentation": "POST JSON-RPC messages to /mcp; the initialize response carries the mcp-session-id header to echo on subsequent requests"
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Extract the session marker from request metadata.
fn session_id_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Resolve the request's marker to a live session.
async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Option<Arc<Session>> {
    let id = session_id_from(headers)?;
    state
        .sessions
        .get(&id)
        .await
        .filter(|session| !session.is_closed())
}

/// Rejection for GET/DELETE requests without a live session.
fn invalid_session_response() -> Response {
    (
        StatusCode::BAD_REQUEST,
        TransportError::InvalidSession.to_string(),
    )
        .into_response()
}

/// Handle JSON-RPC POST requests: attach to a live session or provision
/// one for the initialize handshake.
#[instrument(skip_all, fields(method))]
async fn handle_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    tracing::Span::current().record("method", request.method.as_str());

    let marker = session_id_from(&headers);

    // A recognized marker attaches to its session.
    if let Some(id) = marker.as_deref() {
        if let Some(session) = state.sessions.get(id).await {
            return dispatch_on_session(&state, &session, request).await;
        }
    }

    // No live session: only the initialize handshake may provision one.
    if request.method != "initialize" {
        warn!("Rejecting {} without a live session", request.method);
        return (
            StatusCode::BAD_REQUEST,
            Json(JsonRpcResponse::invalid_session(request.id)),
        )
            .into_response();
    }

    // A client-supplied marker is accepted as an identifier hint.
    let session = state.sessions.create(marker.as_deref()).await;
    info!(session_id = %session.id(), "Session established");
    session.push_message(serde_json::json!({
        "jsonrpc": "2.0",
        "method": "notifications/message",
        "params": {
            "level": "info",
            "data": format!("session {} established", session.id()),
        }
    }));

    dispatch_on_session(&state, &session, request).await
}

/// Forward a request to the protocol engine on behalf of a session.
async fn dispatch_on_session(
    state: &AppState,
    session: &Arc<Session>,
    request: JsonRpcRequest,
) -> Response {
    // One in-flight request per session; later arrivals queue here rather
    // than interleave.
    let _gate = session.acquire().await;

    // A concurrent DELETE may have closed the session while we waited.
    if session.is_closed() {
        return (
            StatusCode::BAD_REQUEST,
            Json(JsonRpcResponse::invalid_session(request.id)),
        )
            .into_response();
    }

    session.touch();
    let response = process_request(state, session, request).await;

    (
        StatusCode::OK,
        [(SESSION_HEADER, session.id().to_string())],
        Json(response),
    )
        .into_response()
}

/// Handle session-bound continuation requests: drain queued
/// server-to-client messages.
#[instrument(skip_all)]
async fn handle_get(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(session) = resolve_session(&state, &headers).await else {
        return invalid_session_response();
    };

    session.touch();
    let messages = session.drain_messages();

    (
        StatusCode::OK,
        [(SESSION_HEADER, session.id().to_string())],
        Json(serde_json::json!({ "messages": messages })),
    )
        .into_response()
}

/// Handle session termination requests.
#[instrument(skip_all)]
async fn handle_delete(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(id) = session_id_from(&headers) else {
        return invalid_session_response();
    };

    if !state.sessions.remove(&id).await {
        return invalid_session_response();
    }

    info!(session_id = %id, "Session terminated");
    StatusCode::OK.into_response()
}

/// Process a JSON-RPC request and return the response.
async fn process_request(
    state: &AppState,
    session: &Session,
    request: JsonRpcRequest,
) -> JsonRpcResponse {
    // Validate JSON-RPC version
    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::invalid_request(request.id);
    }

    match request.method.as_str() {
        // Initialize the MCP session
        "initialize" => handle_initialize(state, request),

        // List available tools
        "tools/list" => handle_tools_list(state, request),

        // Call a tool
        "tools/call" => handle_tools_call(state, request),

        // Notifications (no response payload)
        method if method.starts_with("notifications/") => {
            handle_notification(session, &request);
            JsonRpcResponse::success(request.id, serde_json::json!(null))
        }

        // Unknown method
        _ => {
            warn!("Unknown method: {}", request.method);
            JsonRpcResponse::method_not_found(request.id)
        }
    }
}

/// Handle initialize request.
fn handle_initialize(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing initialize request");

    let result = serde_json::json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": state.server.name(),
            "version": state.server.version()
        },
        "instructions": state.server.instructions()
    });

    JsonRpcResponse::success(request.id, result)
}

/// Handle tools/list request.
fn handle_tools_list(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing tools/list request");

    let tools = state.server.list_tools();
    let result = serde_json::json!({
        "tools": tools
    });

    JsonRpcResponse::success(request.id, result)
}

/// Handle tools/call request.
fn handle_tools_call(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing tools/call request");

    let params = match request.params {
        Some(p) => p,
        None => return JsonRpcResponse::invalid_params(request.id, "Missing params"),
    };

    let name = match params.get("name").and_then(|v| v.as_str()) {
        Some(n) => n.to_string(),
        None => return JsonRpcResponse::invalid_params(request.id, "Missing tool name"),
    };

    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or(serde_json::json!({}));

    match state.server.call_tool(&name, arguments) {
        Ok(result) => JsonRpcResponse::success(request.id, result),
        Err(e) => JsonRpcResponse::invalid_params(request.id, e.to_string()),
    }
}

/// Handle notifications (no response needed).
fn handle_notification(session: &Session, request: &JsonRpcRequest) {
    match request.method.as_str() {
        "notifications/initialized" => {
            info!(session_id = %session.id(), "Client completed the initialize handshake");
            session.mark_initialized();
        }
        _ => {
            info!("Received notification: {}", request.method);
        }
    }
}
