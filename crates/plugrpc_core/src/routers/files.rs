//! `files-handler`: file-system inspection through the file-system service.

use crate::routers::SERVICE_UNAVAILABLE;
use crate::rpc::handler::{parse_input, to_output, FactoryResult, HandlerMap};
use crate::service::collaborators::FileEntry;
use crate::service::registry::ServiceMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

pub const IDENTIFIER: &str = "files-handler";

#[derive(Debug, Deserialize)]
struct PathRequest {
    path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDirectoryResponse {
    pub success: bool,
    pub entries: Vec<FileEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatResponse {
    pub success: bool,
    pub entry: Option<FileEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn handler_factory(services: &ServiceMap) -> FactoryResult<HandlerMap> {
    let list_service = services.file_system();
    let stat_service = list_service.clone();

    Ok(HandlerMap::new()
        .with("listDirectory", move |input: Value| {
            let request: PathRequest = parse_input(input)?;
            let response = match &list_service {
                None => ListDirectoryResponse {
                    success: false,
                    entries: Vec::new(),
                    error: Some(SERVICE_UNAVAILABLE.to_string()),
                },
                Some(service) => match service.list_directory(&request.path) {
                    Ok(entries) => ListDirectoryResponse {
                        success: true,
                        entries,
                        error: None,
                    },
                    Err(err) => ListDirectoryResponse {
                        success: false,
                        entries: Vec::new(),
                        error: Some(err),
                    },
                },
            };
            to_output(&response)
        })
        .with("stat", move |input: Value| {
            let request: PathRequest = parse_input(input)?;
            let response = match &stat_service {
                None => StatResponse {
                    success: false,
                    entry: None,
                    error: Some(SERVICE_UNAVAILABLE.to_string()),
                },
                Some(service) => match service.stat(&request.path) {
                    Ok(entry) => StatResponse {
                        success: true,
                        entry: Some(entry),
                        error: None,
                    },
                    Err(err) => StatResponse {
                        success: false,
                        entry: None,
                        error: Some(err),
                    },
                },
            };
            to_output(&response)
        }))
}

#[cfg(test)]
mod tests {
    use super::handler_factory;
    use crate::service::collaborators::LocalFileSystemService;
    use crate::service::registry::{ServiceHandle, ServiceMap};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn operations_degrade_without_service() {
        let handlers = handler_factory(&ServiceMap::empty()).expect("factory");
        let listed = handlers
            .call("listDirectory", json!({"path": "/tmp"}))
            .expect("listDirectory exists")
            .expect("degraded response");
        assert_eq!(
            listed,
            json!({"success": false, "entries": [], "error": "Service not available"})
        );

        let stat = handlers
            .call("stat", json!({"path": "/tmp"}))
            .expect("stat exists")
            .expect("degraded response");
        assert_eq!(
            stat,
            json!({"success": false, "entry": null, "error": "Service not available"})
        );
    }

    #[test]
    fn list_directory_uses_injected_service() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("note.md"), "hello").expect("write file");

        let mut services = ServiceMap::empty();
        services.insert(ServiceHandle::FileSystem(Arc::new(LocalFileSystemService)));
        let handlers = handler_factory(&services).expect("factory");

        let listed = handlers
            .call("listDirectory", json!({"path": dir.path()}))
            .expect("listDirectory exists")
            .expect("listDirectory succeeds");
        assert_eq!(listed["success"], json!(true));
        assert_eq!(listed["entries"][0]["name"], json!("note.md"));
        assert_eq!(listed["entries"][0]["sizeBytes"], json!(5));

        let missing = handlers
            .call("stat", json!({"path": dir.path().join("missing")}))
            .expect("stat exists")
            .expect("stat returns data");
        assert_eq!(missing["success"], json!(false));
        assert!(missing["error"].is_string());
    }
}
