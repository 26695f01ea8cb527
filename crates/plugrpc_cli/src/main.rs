//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `plugrpc_core` linkage and the built-in composition end to end.
//! - Keep output deterministic for quick local sanity checks.

use plugrpc_core::{init_logging_from_config, PluginHost, RuntimeConfig};
use serde_json::json;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("plugrpc_core version={}", plugrpc_core::core_version());

    let config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("plugrpc config error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("plugrpc logging disabled: {err}");
    }

    let mut host = PluginHost::new(config);
    if let Err(err) = host.initialize_default_services() {
        log::warn!("event=cli_services module=cli status=error error={err}");
    }

    let report = host.validate();
    let endpoint = match host.compose() {
        Ok(endpoint) => endpoint,
        Err(err) => {
            eprintln!("plugrpc compose error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let summary = json!({
        "context": host.execution_context().as_str(),
        "validation": report,
        "contracts": endpoint.contract().namespaces(),
        "handlers": endpoint.handlers().namespaces(),
        "routes": endpoint.dispatch("routes.list", serde_json::Value::Null).to_json(),
    });
    println!("{summary:#}");

    if report.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
