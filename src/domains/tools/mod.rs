//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients to
//! perform specific actions or computations.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `notes.rs` - Shared in-memory note storage
//! - `registry.rs` - Central tool registry: registration, discovery, and
//!   validated dispatch
//! - `router.rs` - rmcp ToolRouter builder for the STDIO transport
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` (e.g., `my_tool.rs`)
//! 2. Define params, execute(), param_specs(), to_tool(), create_route()
//! 3. Export in `definitions/mod.rs`
//! 4. Register in `registry.rs` (`build_registry`)
//! 5. Add route in `router.rs` (`build_tool_router`)

pub mod definitions;
mod error;
mod notes;
mod registry;
pub mod router;

pub use error::ToolError;
pub use notes::NoteStore;
pub use registry::{ParamKind, ParamSpec, ToolRegistry, build_registry};
pub use router::build_tool_router;
