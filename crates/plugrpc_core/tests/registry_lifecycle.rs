use plugrpc_core::plugin::builtin::{cli_plugin, CLI_PLUGIN_ID};
use plugrpc_core::{
    core_plugins, DuplicatePolicy, PluginDescriptor, PluginHost, PluginMetadata, PluginRegistry,
    PluginRegistryError, RegisterOutcome, RuntimeConfig,
};

fn plugin(id: &str, name: &str) -> PluginDescriptor {
    PluginDescriptor::new(
        id,
        PluginMetadata {
            name: name.to_string(),
            ..PluginMetadata::default()
        },
    )
}

#[test]
fn repeated_registration_keeps_a_single_entry() {
    let mut registry = PluginRegistry::new(core_plugins());
    let core_len = registry.len();

    registry.register(plugin("notes", "v1")).expect("first register");
    let outcome = registry.register(plugin("notes", "v2")).expect("second register");

    assert!(matches!(outcome, RegisterOutcome::Replaced(_)));
    assert_eq!(registry.len(), core_len + 1);
    assert_eq!(
        registry.get("notes").expect("notes present").metadata.name,
        "v2"
    );
}

#[test]
fn core_plugins_survive_unregister_and_clear() {
    let mut registry = PluginRegistry::new(core_plugins());
    registry
        .register(plugin(CLI_PLUGIN_ID, "Shadow CLI"))
        .expect("overwrite core id");
    registry.register(plugin("extra", "Extra")).expect("register extra");

    assert!(!registry.unregister(CLI_PLUGIN_ID));
    assert!(registry.has(CLI_PLUGIN_ID));

    registry.clear_additional();
    let ids: Vec<&str> = registry.get_all().into_iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["routes", "cli", "files", "logs"]);
    assert_eq!(
        registry.get(CLI_PLUGIN_ID).expect("cli").metadata.name,
        cli_plugin().metadata.name
    );
    assert!(registry.get_additional().is_empty());
}

#[test]
fn duplicate_policy_controls_second_registration() {
    let mut keep =
        PluginRegistry::with_policy(Vec::<PluginDescriptor>::new(), DuplicatePolicy::KeepExisting);
    keep.register(plugin("notes", "v1")).expect("first");
    let outcome = keep.register(plugin("notes", "v2")).expect("kept");
    assert!(matches!(outcome, RegisterOutcome::Kept(_)));
    assert_eq!(keep.get("notes").expect("notes").metadata.name, "v1");

    let mut reject =
        PluginRegistry::with_policy(Vec::<PluginDescriptor>::new(), DuplicatePolicy::Reject);
    reject.register(plugin("notes", "v1")).expect("first");
    let err = reject
        .register(plugin("notes", "v2"))
        .expect_err("duplicate must be rejected");
    assert!(matches!(err, PluginRegistryError::DuplicatePluginId(ref id) if id == "notes"));
}

#[test]
fn scope_cleanup_restores_registry_without_evicting_newer_owner() {
    let host = PluginHost::new(RuntimeConfig::default());
    let baseline = host.plugin_ids();

    let mut stale = host.open_scope();
    stale.register(plugin("panel", "stale")).expect("stale register");
    {
        let mut fresh = host.open_scope();
        fresh.register(plugin("panel", "fresh")).expect("fresh register");
        fresh.register(plugin("widget", "fresh")).expect("fresh widget");

        stale.close();
        let snapshot = host.snapshot();
        let panel = snapshot
            .iter()
            .find(|p| p.id == "panel")
            .expect("newer registration survives stale scope");
        assert_eq!(panel.metadata.name, "fresh");
    }

    assert_eq!(host.plugin_ids(), baseline);
}

#[test]
fn scope_overwrite_never_evicts_another_owner() {
    let host = PluginHost::new(RuntimeConfig::default());
    host.register(plugin("board", "host")).expect("unscoped register");

    let mut outer = host.open_scope();
    outer.register(plugin("panel", "outer")).expect("outer register");
    {
        let mut inner = host.open_scope();
        inner.register(plugin("panel", "inner")).expect("inner panel");
        inner.register(plugin("board", "inner")).expect("inner board");
    }

    let snapshot = host.snapshot();
    let name_of = |id: &str| {
        snapshot
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.metadata.name.clone())
    };
    assert_eq!(name_of("panel").as_deref(), Some("outer"));
    assert_eq!(name_of("board").as_deref(), Some("host"));
    assert_eq!(outer.owned_ids(), vec!["panel"]);

    outer.close();
    assert!(!host.plugin_ids().contains(&"panel".to_string()));
    assert!(host.plugin_ids().contains(&"board".to_string()));
}

#[test]
fn scoped_core_override_is_reverted_on_close() {
    let host = PluginHost::new(RuntimeConfig::default());
    let mut scope = host.open_scope();
    scope
        .register(plugin(CLI_PLUGIN_ID, "Scoped CLI"))
        .expect("override core id");
    scope.close();

    let snapshot = host.snapshot();
    let cli = snapshot
        .iter()
        .find(|p| p.id == CLI_PLUGIN_ID)
        .expect("core cli stays registered");
    assert_eq!(cli.metadata.name, cli_plugin().metadata.name);
    assert_eq!(host.plugin_ids(), vec!["routes", "cli", "files", "logs"]);
}

#[test]
fn host_policy_comes_from_config() {
    let host = PluginHost::new(RuntimeConfig {
        duplicate_policy: DuplicatePolicy::Reject,
        ..RuntimeConfig::default()
    });
    assert!(host.register(plugin(CLI_PLUGIN_ID, "again")).is_err());
}
