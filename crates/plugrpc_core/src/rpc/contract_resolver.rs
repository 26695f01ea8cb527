//! Contract side of composition.

use crate::plugin::model::PluginDescriptor;
use crate::rpc::contract::ComposedContract;
use log::debug;

/// Nests every contributed contract under its plugin id.
///
/// Plugins without a contract are skipped; when nothing contributes, the
/// result is the explicitly empty contract.
pub fn resolve_contracts<'a>(
    plugins: impl IntoIterator<Item = &'a PluginDescriptor>,
) -> ComposedContract {
    let mut composed = ComposedContract::empty();
    for plugin in plugins {
        let Some(contract) = plugin.contract() else {
            continue;
        };
        composed.insert(plugin.id.clone(), contract.clone());
    }
    debug!(
        "event=contracts_resolved module=rpc status=ok count={}",
        composed.len()
    );
    composed
}
