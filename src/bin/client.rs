//! Demo Client Entry Point
//!
//! Connects to a running server, discovers its tools, invokes each of them
//! once, polls for queued server messages, and terminates the session.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use notes_mcp_server::client::McpClient;

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let endpoint = std::env::var("MCP_SERVER_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:3000/mcp".to_string());

    let mut client = McpClient::new(endpoint);

    let info = client.initialize().await?;
    println!(
        "Connected to {} (session {})",
        info["serverInfo"]["name"].as_str().unwrap_or("server"),
        client.session_id().unwrap_or("unknown")
    );

    let tools = client.list_tools().await?;
    println!("Available tools:");
    for (i, tool) in tools.iter().enumerate() {
        println!(
            "  [{}] {} - {}",
            i,
            tool.name,
            tool.description.as_deref().unwrap_or("")
        );
    }

    let result = client
        .call_tool("add", serde_json::json!({"a": 2, "b": 3}))
        .await?;
    println!("add(2, 3) -> {}", McpClient::result_text(&result).unwrap_or("no output"));

    let result = client
        .call_tool(
            "create-note",
            serde_json::json!({"content": "hello from the demo client"}),
        )
        .await?;
    println!("create-note -> {}", McpClient::result_text(&result).unwrap_or("no output"));

    let result = client.call_tool("list-notes", serde_json::json!({})).await?;
    println!("list-notes -> {}", McpClient::result_text(&result).unwrap_or("no output"));

    for message in client.poll_messages().await? {
        println!("queued server message: {}", message);
    }

    client.terminate().await?;
    println!("Session terminated");

    Ok(())
}
