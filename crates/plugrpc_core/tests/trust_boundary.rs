use plugrpc_core::{
    collect_services, initialize_server_services, CompositionStrategy, Contract,
    EndpointResponse, ExecutionContext, HandlerMap, HandlerSourcing, PluginDescriptor,
    PluginHost, PluginMetadata, RouterRegistry, RuntimeConfig, ServiceHandle, ServiceKey,
    ServiceRegistry,
};
use plugrpc_core::service::collaborators::MemoryLogStore;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[test]
fn untrusted_context_never_sees_registered_services() {
    let mut registry = ServiceRegistry::new();
    initialize_server_services(
        ExecutionContext::Trusted,
        &mut registry,
        [ServiceHandle::LogStore(Arc::new(MemoryLogStore::default()))],
    )
    .expect("trusted init");

    assert!(collect_services(ExecutionContext::Trusted, &registry).contains(ServiceKey::LogStore));
    assert!(collect_services(ExecutionContext::Untrusted, &registry).is_empty());
}

#[test]
fn untrusted_host_composes_registry_plugins_in_degraded_mode() {
    let host = PluginHost::new(RuntimeConfig::untrusted());
    let endpoint = host.compose().expect("registry strategy works untrusted");

    assert_eq!(
        endpoint.dispatch("logs.clear", Value::Null),
        EndpointResponse::Success(json!({"success": false, "error": "Service not available"}))
    );
    assert_eq!(
        endpoint.dispatch("cli.available", Value::Null),
        EndpointResponse::Success(json!({"available": false}))
    );
}

#[test]
fn embedded_factory_in_untrusted_context_is_fatal_and_not_invoked() {
    let invoked = Arc::new(AtomicBool::new(false));
    let flag = invoked.clone();
    let host = PluginHost::with_parts(
        RuntimeConfig {
            strategy: CompositionStrategy::Embedded,
            ..RuntimeConfig::untrusted()
        },
        [PluginDescriptor::new("secret", PluginMetadata::default()).with_rpc(
            Contract::new(json!({"read": {"input": null, "output": "string"}})),
            Some(HandlerSourcing::factory(move |_services| {
                flag.store(true, Ordering::SeqCst);
                Ok(HandlerMap::new())
            })),
        )],
        RouterRegistry::default(),
    );

    let err = host.compose().expect_err("untrusted embedded factory must fail");
    assert!(err.to_string().contains("trusted"));
    assert!(!invoked.load(Ordering::SeqCst));
}

#[test]
fn direct_handlers_are_usable_untrusted() {
    let host = PluginHost::with_parts(
        RuntimeConfig {
            strategy: CompositionStrategy::Embedded,
            ..RuntimeConfig::untrusted()
        },
        [PluginDescriptor::new("clock", PluginMetadata::default()).with_rpc(
            Contract::new(json!({"zone": {"input": null, "output": "string"}})),
            Some(HandlerSourcing::Direct(
                HandlerMap::new().with("zone", |_input: Value| Ok(json!("UTC"))),
            )),
        )],
        RouterRegistry::default(),
    );

    let endpoint = host.compose().expect("direct sourcing is context free");
    assert_eq!(
        endpoint.dispatch("clock.zone", Value::Null),
        EndpointResponse::Success(json!("UTC"))
    );
}
