//! Transport layer for the MCP server.
//!
//! This module provides the transport implementations and the session
//! machinery they share:
//! - **HTTP**: session-aware JSON-RPC over HTTP - feature: `http`
//! - **STDIO**: standard input/output (classic MCP mode) - feature: `stdio`
//!
//! The HTTP transport is the interesting one: it multiplexes many client
//! sessions over a stateless substrate. The [`session`] module owns session
//! identity and lifecycle; [`rpc`] holds the JSON-RPC envelopes shared with
//! the client.

mod config;
mod error;
mod service;

pub mod rpc;
pub mod session;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

/// Name of the header carrying the session identifier.
pub const SESSION_ID_HEADER: &str = "mcp-session-id";

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use rpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use service::TransportService;
pub use session::{Session, SessionStore};

#[cfg(feature = "http")]
pub use config::HttpConfig;
