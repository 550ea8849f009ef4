//! Tool Registry - central registration and dispatch for all tools.
//!
//! The registry owns the set of invocable tools. Registration happens once
//! at startup and preserves insertion order, so discovery always enumerates
//! tools in the order they were registered. Invocation validates the
//! declared parameters before the handler runs: a missing or non-coercible
//! argument fails with `InvalidArguments` and the handler is never called.

use rmcp::model::{CallToolResult, Tool};
use serde_json::{Map, Value};
use tracing::warn;

use super::error::ToolError;
use crate::domains::tools::definitions::{AddTool, CreateNoteTool, ListNotesTool};
use crate::domains::tools::notes::NoteStore;

// ============================================================================
// Parameter shape
// ============================================================================

/// Primitive kinds a tool parameter may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Boolean,
}

/// A single declared parameter of a tool's input shape.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
}

impl ParamSpec {
    pub fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::String,
        }
    }

    pub fn number(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Number,
        }
    }

    pub fn boolean(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Boolean,
        }
    }

    /// Coerce `value` to this parameter's kind.
    ///
    /// Native JSON types pass through; numbers and booleans are also
    /// accepted from their string renderings, which is what line-oriented
    /// clients send.
    fn coerce(&self, value: &Value) -> Result<Value, ToolError> {
        match self.kind {
            ParamKind::String => match value {
                Value::String(_) => Ok(value.clone()),
                _ => Err(self.type_error("string", value)),
            },
            ParamKind::Number => match value {
                Value::Number(_) => Ok(value.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| self.type_error("number", value)),
                _ => Err(self.type_error("number", value)),
            },
            ParamKind::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::String(s) => match s.trim() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    _ => Err(self.type_error("boolean", value)),
                },
                _ => Err(self.type_error("boolean", value)),
            },
        }
    }

    fn type_error(&self, expected: &str, got: &Value) -> ToolError {
        ToolError::invalid_arguments(format!(
            "parameter '{}' must be a {}, got {}",
            self.name, expected, got
        ))
    }
}

// ============================================================================
// Tool Registry
// ============================================================================

type ToolHandler =
    Box<dyn Fn(Map<String, Value>) -> Result<CallToolResult, ToolError> + Send + Sync>;

struct RegisteredTool {
    tool: Tool,
    params: Vec<ParamSpec>,
    handler: ToolHandler,
}

/// Tool registry - manages all available tools.
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a tool: its wire metadata, its declared parameter shape,
    /// and the handler invoked with validated arguments.
    pub fn register(
        &mut self,
        tool: Tool,
        params: Vec<ParamSpec>,
        handler: impl Fn(Map<String, Value>) -> Result<CallToolResult, ToolError>
        + Send
        + Sync
        + 'static,
    ) {
        self.entries.push(RegisteredTool {
            tool,
            params,
            handler: Box::new(handler),
        });
    }

    /// All tool metadata, in registration order.
    pub fn list(&self) -> Vec<Tool> {
        self.entries.iter().map(|e| e.tool.clone()).collect()
    }

    /// All tool names, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.tool.name.as_ref()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke a tool by name.
    ///
    /// Fails with `NotFound` for an unregistered name and with
    /// `InvalidArguments` when validation rejects the arguments; the
    /// handler only ever sees arguments that passed validation.
    pub fn invoke(&self, name: &str, arguments: Value) -> Result<CallToolResult, ToolError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.tool.name == name)
            .ok_or_else(|| {
                warn!("Unknown tool requested: {}", name);
                ToolError::not_found(name)
            })?;

        let validated = validate_arguments(&entry.params, arguments)?;
        (entry.handler)(validated)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check every declared parameter against the supplied arguments, returning
/// the coerced argument map the handler will receive.
fn validate_arguments(
    specs: &[ParamSpec],
    arguments: Value,
) -> Result<Map<String, Value>, ToolError> {
    let args = match arguments {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(ToolError::invalid_arguments(format!(
                "arguments must be an object, got {}",
                other
            )));
        }
    };

    let mut validated = Map::new();
    for spec in specs {
        let value = args.get(spec.name).ok_or_else(|| {
            ToolError::invalid_arguments(format!("missing parameter '{}'", spec.name))
        })?;
        validated.insert(spec.name.to_string(), spec.coerce(value)?);
    }

    Ok(validated)
}

/// Build the registry with all tools, wired to the shared note store.
///
/// Registration order here is the order discovery reports.
pub fn build_registry(notes: NoteStore) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(AddTool::to_tool(), AddTool::param_specs(), |args| {
        let params = serde_json::from_value(Value::Object(args))
            .map_err(|e| ToolError::invalid_arguments(e.to_string()))?;
        Ok(AddTool::execute(&params))
    });

    let store = notes.clone();
    registry.register(
        CreateNoteTool::to_tool(),
        CreateNoteTool::param_specs(),
        move |args| {
            let params = serde_json::from_value(Value::Object(args))
                .map_err(|e| ToolError::invalid_arguments(e.to_string()))?;
            Ok(CreateNoteTool::execute(&params, &store))
        },
    );

    let store = notes;
    registry.register(
        ListNotesTool::to_tool(),
        ListNotesTool::param_specs(),
        move |_args| Ok(ListNotesTool::execute(&store)),
    );

    registry
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

    fn test_registry() -> ToolRegistry {
        build_registry(NoteStore::new())
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let registry = test_registry();
        assert_eq!(
            registry.tool_names(),
            vec!["add", "create-note", "list-notes"]
        );
        // Enumeration is restartable: a second listing sees the same order.
        assert_eq!(
            registry.tool_names(),
            vec!["add", "create-note", "list-notes"]
        );
    }

    #[test]
    fn test_invoke_add() {
        let registry = test_registry();
        let result = registry
            .invoke("add", serde_json::json!({"a": 2, "b": 3}))
            .unwrap();
        assert_eq!(result_text(&result), "Result: 5");
    }

    #[test]
    fn test_invoke_add_coerces_numeric_strings() {
        let registry = test_registry();
        let result = registry
            .invoke("add", serde_json::json!({"a": "2", "b": 3}))
            .unwrap();
        assert_eq!(result_text(&result), "Result: 5");
    }

    #[test]
    fn test_invoke_unknown_tool_is_not_found() {
        let registry = test_registry();
        let err = registry
            .invoke("subtract", serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn test_invoke_add_missing_argument() {
        let registry = test_registry();
        let err = registry
            .invoke("add", serde_json::json!({"a": 2}))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().contains("missing parameter 'b'"));
    }

    #[test]
    fn test_invoke_rejects_uncoercible_argument_before_handler_runs() {
        let notes = NoteStore::new();
        let registry = build_registry(notes.clone());

        let err = registry
            .invoke("create-note", serde_json::json!({"content": 42}))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        // The handler never ran, so nothing was stored.
        assert!(notes.is_empty());
    }

    #[test]
    fn test_invoke_note_tools_share_state() {
        let registry = test_registry();
        registry
            .invoke("create-note", serde_json::json!({"content": "x"}))
            .unwrap();

        let result = registry
            .invoke("list-notes", serde_json::json!({}))
            .unwrap();
        assert!(result_text(&result).contains("1. x"));

        registry
            .invoke("create-note", serde_json::json!({"content": "y"}))
            .unwrap();
        let result = registry
            .invoke("list-notes", serde_json::Value::Null)
            .unwrap();
        let text = result_text(&result);
        assert!(text.contains("1. x"));
        assert!(text.contains("2. y"));
    }

    #[test]
    fn test_validate_drops_undeclared_arguments() {
        let registry = test_registry();
        let result = registry
            .invoke("add", serde_json::json!({"a": 1, "b": 2, "extra": true}))
            .unwrap();
        assert_eq!(result_text(&result), "Result: 3");
    }

    #[test]
    fn test_boolean_coercion() {
        let spec = ParamSpec::boolean("flag");
        assert_eq!(
            spec.coerce(&serde_json::json!("true")).unwrap(),
            serde_json::json!(true)
        );
        assert!(spec.coerce(&serde_json::json!("yes")).is_err());
    }
}
