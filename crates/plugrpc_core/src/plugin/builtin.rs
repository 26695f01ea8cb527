//! Built-in core plugin descriptors.
//!
//! Descriptors name their implementation by router identifier only, so this
//! module is safe to build in any execution context.

use crate::plugin::model::{
    HandlerSourcing, PluginDescriptor, PluginMenuItem, PluginMetadata, PluginPage, PluginUi,
};
use crate::rpc::contract::Contract;
use serde_json::json;

pub const ROUTES_PLUGIN_ID: &str = "routes";
pub const CLI_PLUGIN_ID: &str = "cli";
pub const FILES_PLUGIN_ID: &str = "files";
pub const LOGS_PLUGIN_ID: &str = "logs";

/// Core plugin set seeded into every registry, in composition order.
pub fn core_plugins() -> Vec<PluginDescriptor> {
    vec![routes_plugin(), cli_plugin(), files_plugin(), logs_plugin()]
}

pub fn routes_plugin() -> PluginDescriptor {
    builtin(
        ROUTES_PLUGIN_ID,
        "Routes",
        "Browse the registered RPC routers.",
        "route",
        "routes-handler",
        Contract::new(json!({
            "list": {
                "input": null,
                "output": { "routers": [{ "identifier": "string", "name": "string", "description": "string" }] }
            },
            "get": {
                "input": { "identifier": "string" },
                "output": { "found": "boolean", "router": "RouterSummary?" }
            }
        })),
    )
}

pub fn cli_plugin() -> PluginDescriptor {
    builtin(
        CLI_PLUGIN_ID,
        "CLI",
        "Run shell commands on the server.",
        "terminal",
        "cli-handler",
        Contract::new(json!({
            "execute": {
                "input": { "command": "string", "args": ["string"], "cwd": "string?" },
                "output": {
                    "success": "boolean",
                    "stdout": "string",
                    "stderr": "string",
                    "exitCode": "number",
                    "error": "string?"
                }
            },
            "available": {
                "input": null,
                "output": { "available": "boolean" }
            }
        })),
    )
}

pub fn files_plugin() -> PluginDescriptor {
    builtin(
        FILES_PLUGIN_ID,
        "Files",
        "Inspect directories and files on the server.",
        "folder",
        "files-handler",
        Contract::new(json!({
            "listDirectory": {
                "input": { "path": "string" },
                "output": { "success": "boolean", "entries": ["FileEntry"], "error": "string?" }
            },
            "stat": {
                "input": { "path": "string" },
                "output": { "success": "boolean", "entry": "FileEntry?", "error": "string?" }
            }
        })),
    )
}

pub fn logs_plugin() -> PluginDescriptor {
    builtin(
        LOGS_PLUGIN_ID,
        "Logs",
        "Record and browse application log entries.",
        "scroll",
        "logs-handler",
        Contract::new(json!({
            "append": {
                "input": { "level": "string", "message": "string" },
                "output": { "success": "boolean", "error": "string?" }
            },
            "recent": {
                "input": { "limit": "number?" },
                "output": { "success": "boolean", "records": ["LogRecord"], "error": "string?" }
            },
            "clear": {
                "input": null,
                "output": { "success": "boolean", "error": "string?" }
            }
        })),
    )
}

fn builtin(
    id: &str,
    name: &str,
    description: &str,
    icon: &str,
    identifier: &str,
    contract: Contract,
) -> PluginDescriptor {
    let path = format!("/{id}");
    PluginDescriptor::new(
        id,
        PluginMetadata {
            name: name.to_string(),
            description: description.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            author: "plugrpc".to_string(),
            icon: icon.to_string(),
        },
    )
    .with_rpc(
        contract,
        Some(HandlerSourcing::ByIdentifier(identifier.to_string())),
    )
    .with_ui(PluginUi {
        pages: vec![PluginPage {
            path: path.clone(),
            title: name.to_string(),
        }],
        menu_items: vec![PluginMenuItem {
            label: name.to_string(),
            path,
            icon: Some(icon.to_string()),
        }],
        reduced: Some(json!({ "title": name, "icon": icon })),
    })
}
