//! `logs-handler`: log storage through the log store service.

use crate::routers::SERVICE_UNAVAILABLE;
use crate::rpc::handler::{parse_input, to_output, FactoryResult, HandlerMap};
use crate::service::collaborators::{now_epoch_ms, LogRecord, LogStoreService};
use crate::service::registry::ServiceMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const IDENTIFIER: &str = "logs-handler";

const DEFAULT_RECENT_LIMIT: usize = 100;
const MAX_RECENT_LIMIT: usize = 1_000;

#[derive(Debug, Deserialize)]
struct AppendRequest {
    level: String,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecentRequest {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogAckResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentLogsResponse {
    pub success: bool,
    pub records: Vec<LogRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn handler_factory(services: &ServiceMap) -> FactoryResult<HandlerMap> {
    let store = services.log_store();
    let append_store = store.clone();
    let recent_store = store.clone();
    let clear_store = store;

    Ok(HandlerMap::new()
        .with("append", move |input: Value| {
            let request: AppendRequest = parse_input(input)?;
            let response = with_store(&append_store, |store| {
                store.append(LogRecord {
                    level: request.level.trim().to_ascii_lowercase(),
                    message: request.message,
                    timestamp_ms: now_epoch_ms(),
                });
            });
            to_output(&response)
        })
        .with("recent", move |input: Value| {
            let request: RecentRequest = if input.is_null() {
                RecentRequest::default()
            } else {
                parse_input(input)?
            };
            let limit = request
                .limit
                .unwrap_or(DEFAULT_RECENT_LIMIT)
                .min(MAX_RECENT_LIMIT);
            let response = match &recent_store {
                Some(store) => RecentLogsResponse {
                    success: true,
                    records: store.recent(limit),
                    error: None,
                },
                None => RecentLogsResponse {
                    success: false,
                    records: Vec::new(),
                    error: Some(SERVICE_UNAVAILABLE.to_string()),
                },
            };
            to_output(&response)
        })
        .with("clear", move |_input: Value| {
            let response = with_store(&clear_store, |store| store.clear());
            to_output(&response)
        }))
}

fn with_store(
    store: &Option<Arc<dyn LogStoreService>>,
    action: impl FnOnce(&dyn LogStoreService),
) -> LogAckResponse {
    match store {
        Some(store) => {
            action(store.as_ref());
            LogAckResponse {
                success: true,
                error: None,
            }
        }
        None => LogAckResponse {
            success: false,
            error: Some(SERVICE_UNAVAILABLE.to_string()),
        },
    }
}
