//! `cli-handler`: command execution through the command service.

use crate::routers::SERVICE_UNAVAILABLE;
use crate::rpc::handler::{parse_input, to_output, FactoryResult, HandlerMap};
use crate::service::collaborators::{CommandOutput, CommandRequest};
use crate::service::registry::ServiceMap;
use log::info;
use serde_json::{json, Value};

pub const IDENTIFIER: &str = "cli-handler";

/// Degraded `execute` response used when no command service is injected.
pub fn unavailable_output() -> CommandOutput {
    CommandOutput {
        success: false,
        stdout: String::new(),
        stderr: String::new(),
        exit_code: 1,
        error: Some(SERVICE_UNAVAILABLE.to_string()),
    }
}

pub fn handler_factory(services: &ServiceMap) -> FactoryResult<HandlerMap> {
    let command_service = services.command();
    let available = command_service.is_some();

    Ok(HandlerMap::new()
        .with("execute", move |input: Value| {
            let request: CommandRequest = parse_input(input)?;
            let output = match &command_service {
                Some(service) => {
                    info!(
                        "event=command_execute module=routers status=ok command={}",
                        request.command
                    );
                    service.execute(&request)
                }
                None => unavailable_output(),
            };
            to_output(&output)
        })
        .with("available", move |_input: Value| {
            Ok(json!({ "available": available }))
        }))
}
