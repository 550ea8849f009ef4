//! Note listing tool definition.

use futures::FutureExt;
use rmcp::{
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Content, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domains::tools::notes::NoteStore;
use crate::domains::tools::registry::ParamSpec;

/// Parameters for the note listing tool. Takes no arguments.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListNotesParams {}

/// Note listing tool - returns all notes saved so far.
pub struct ListNotesTool;

impl ListNotesTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "list-notes";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Returns all notes saved so far";

    /// Execute the tool logic.
    #[instrument(skip_all)]
    pub fn execute(notes: &NoteStore) -> CallToolResult {
        let stored = notes.list();
        info!("Listing {} notes", stored.len());

        if stored.is_empty() {
            return CallToolResult::success(vec![Content::text("No notes found yet.")]);
        }

        let formatted = stored
            .iter()
            .enumerate()
            .map(|(i, note)| format!("{}. {}", i + 1, note))
            .collect::<Vec<_>>()
            .join("\n");

        CallToolResult::success(vec![Content::text(format!("Notes:\n{}", formatted))])
    }

    /// Declared parameter shape used for registry-side validation.
    pub fn param_specs() -> Vec<ParamSpec> {
        Vec::new()
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<ListNotesParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for the STDIO transport.
    pub fn create_route<S>(notes: NoteStore) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |_ctx: ToolCallContext<'_, S>| {
            let notes = notes.clone();
            async move { Ok(Self::execute(&notes)) }.boxed()
        })
    }
}
