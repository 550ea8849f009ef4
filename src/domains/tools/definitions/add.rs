//! Addition tool definition.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Content, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domains::tools::registry::ParamSpec;

/// Parameters for the addition tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddParams {
    /// First addend.
    pub a: f64,

    /// Second addend.
    pub b: f64,
}

/// Addition tool - adds two numbers together.
pub struct AddTool;

impl AddTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "add";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Adds two numbers together";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(a = params.a, b = params.b))]
    pub fn execute(params: &AddParams) -> CallToolResult {
        let sum = params.a + params.b;
        info!("Addition tool called: {} + {} = {}", params.a, params.b, sum);

        CallToolResult::success(vec![Content::text(format!("Result: {}", sum))])
    }

    /// Declared parameter shape used for registry-side validation.
    pub fn param_specs() -> Vec<ParamSpec> {
        vec![ParamSpec::number("a"), ParamSpec::number("b")]
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<AddParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for the STDIO transport.
    pub fn create_route<S>() -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            async move {
                let params: AddParams = serde_json::from_value(serde_json::Value::Object(args))
                    .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                Ok(Self::execute(&params))
            }
            .boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_text(result: &CallToolResult) -> &str {
        match &result.content[0].raw {
            rmcp::model::RawContent::Text(text) => &text.text,
            _ => panic!("Expected text content"),
        }
    }

    #[test]
    fn test_add_integers() {
        let params = AddParams { a: 2.0, b: 3.0 };
        let result = AddTool::execute(&params);
        assert!(result.is_error.is_none() || !result.is_error.unwrap());
        assert_eq!(result_text(&result), "Result: 5");
    }

    #[test]
    fn test_add_fractional() {
        let params = AddParams { a: 2.5, b: 3.0 };
        let result = AddTool::execute(&params);
        assert_eq!(result_text(&result), "Result: 5.5");
    }

    #[test]
    fn test_add_negative() {
        let params = AddParams { a: -4.0, b: 3.0 };
        let result = AddTool::execute(&params);
        assert_eq!(result_text(&result), "Result: -1");
    }
}
