//! Tool Router - builds the rmcp ToolRouter for the STDIO transport.
//!
//! Each tool definition knows how to create its own route; this module just
//! assembles them. Route order matches the registry's registration order so
//! both transports enumerate tools identically.

use rmcp::handler::server::tool::ToolRouter;

use super::definitions::{AddTool, CreateNoteTool, ListNotesTool};
use crate::domains::tools::notes::NoteStore;

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(notes: NoteStore) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new()
        .with_route(AddTool::create_route())
        .with_route(CreateNoteTool::create_route(notes.clone()))
        .with_route(ListNotesTool::create_route(notes))
}

#[cfg(test)]
mod tests {
    use super::super::registry::build_registry;
    use super::*;

    struct TestServer {}

    #[test]
    fn test_build_router() {
        let router: ToolRouter<TestServer> = build_tool_router(NoteStore::new());
        let tools = router.list_all();
        assert_eq!(tools.len(), 3);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"add"));
        assert!(names.contains(&"create-note"));
        assert!(names.contains(&"list-notes"));
    }

    #[test]
    fn test_registry_matches_router() {
        // Ensure registry and router expose the same tools
        let registry = build_registry(NoteStore::new());
        let registry_names = registry.tool_names();

        let router: ToolRouter<TestServer> = build_tool_router(NoteStore::new());
        let router_tools = router.list_all();
        let router_names: Vec<_> = router_tools.iter().map(|t| t.name.as_ref()).collect();

        assert_eq!(registry_names.len(), router_names.len());
        for name in registry_names {
            assert!(router_names.contains(&name));
        }
    }
}
