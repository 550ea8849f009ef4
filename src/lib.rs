//! Notes MCP Server Library
//!
//! A minimal Model Context Protocol (MCP) server whose interesting part is
//! the session layer: many concurrent client sessions multiplexed over a
//! stateless HTTP transport, each identified by an opaque token carried in
//! the `mcp-session-id` header.
//!
//! # Architecture
//!
//! - **core**: infrastructure - configuration, error handling, the shared
//!   protocol engine, and the transport layer with its session store
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: the tool registry and the tool definitions clients invoke
//! - **client** (feature `client`): a session-aware HTTP client that
//!   discovers and invokes tools
//!
//! # Example
//!
//! ```rust,no_run
//! use notes_mcp_server::{core::Config, core::McpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config);
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

#[cfg(feature = "client")]
pub mod client;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
