//! Note creation tool definition.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Content, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domains::tools::notes::NoteStore;
use crate::domains::tools::registry::ParamSpec;

/// Parameters for the note creation tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateNoteParams {
    /// Text of the note to save.
    pub content: String,
}

/// Note creation tool - saves a note to the in-memory store.
pub struct CreateNoteTool;

impl CreateNoteTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "create-note";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Saves a note";

    /// Execute the tool logic.
    #[instrument(skip_all)]
    pub fn execute(params: &CreateNoteParams, notes: &NoteStore) -> CallToolResult {
        let total = notes.add(params.content.clone());
        info!("Note saved, {} total", total);

        CallToolResult::success(vec![Content::text(format!(
            "Note saved: \"{}\" (total: {})",
            params.content, total
        ))])
    }

    /// Declared parameter shape used for registry-side validation.
    pub fn param_specs() -> Vec<ParamSpec> {
        vec![ParamSpec::string("content")]
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<CreateNoteParams>(),
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
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let notes = notes.clone();
            async move {
                let params: CreateNoteParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                Ok(Self::execute(&params, &notes))
            }
            .boxed()
        })
    }
}
