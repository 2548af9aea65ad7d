//! Component registry and action bindings.
//!
//! Shared by the interaction tracker, the prediction engine, and the
//! preloader —
//! callers hold an `Arc<ComponentRegistry>` rather than reaching through a
//! global.

use parking_lot::RwLock;
use predict_core::ComponentDescriptor;
use std::collections::HashMap;

/// Insertion-order-preserving, single-writer-friendly registry of
/// components and the actions bound to them.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    components: HashMap<String, ComponentDescriptor>,
    order: Vec<String>,
    bindings: HashMap<String, String>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component. A duplicate `id` is a no-op with a warning
    ///: the first registration wins.
    pub fn track_component(
        &self,
        id: impl Into<String>,
        kind: impl Into<String>,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) {
        let id = id.into();
        let mut inner = self.inner.write();
        if inner.components.contains_key(&id) {
            tracing::warn!(component_id = %id, "duplicate component registration ignored");
            return;
        }
        inner.order.push(id.clone());
        inner.components.insert(
            id.clone(),
            ComponentDescriptor {
                id,
                kind: kind.into(),
                metadata,
            },
        );
    }

    /// Bind an action type to a previously registered component. Rejects
    /// (no-op, warning) if the component isn't tracked.
    pub fn associate_action_with_component(&self, action_type: impl Into<String>, component_id: impl Into<String>) {
        let action_type = action_type.into();
        let component_id = component_id.into();
        let mut inner = self.inner.write();
        if !inner.components.contains_key(&component_id) {
            tracing::warn!(
                action_type = %action_type,
                component_id = %component_id,
                "cannot bind action to an untracked component"
            );
            return;
        }
        inner.bindings.insert(action_type, component_id);
    }

    /// Resolve an action type to its bound component id. Unknown actions
    /// fail softly with `None`.
    pub fn get_component_by_action(&self, action_type: &str) -> Option<String> {
        self.inner.read().bindings.get(action_type).cloned()
    }

    /// List registered components in insertion order.
    pub fn list(&self) -> Vec<ComponentDescriptor> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.components.get(id).cloned())
            .collect()
    }

    /// Whether `id` is already tracked.
    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().components.contains_key(id)
    }

    /// Look up a tracked component's descriptor by id.
    pub fn get_component(&self, id: &str) -> Option<ComponentDescriptor> {
        self.inner.read().components.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_metadata() -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::new()
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let registry = ComponentRegistry::new();
        registry.track_component("c1", "page", empty_metadata());
        registry.track_component("c1", "modal", empty_metadata());
        assert_eq!(registry.list()[0].kind, "page");
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn binding_requires_tracked_component() {
        let registry = ComponentRegistry::new();
        registry.associate_action_with_component("go-c1", "c1");
        assert_eq!(registry.get_component_by_action("go-c1"), None);

        registry.track_component("c1", "page", empty_metadata());
        registry.associate_action_with_component("go-c1", "c1");
        assert_eq!(registry.get_component_by_action("go-c1"), Some("c1".to_string()));
    }

    #[test]
    fn get_component_returns_none_for_untracked_id() {
        let registry = ComponentRegistry::new();
        assert!(registry.get_component("ghost").is_none());
        registry.track_component("c1", "page", empty_metadata());
        assert_eq!(registry.get_component("c1").unwrap().kind, "page");
    }

    #[test]
    fn unknown_action_resolves_to_none() {
        let registry = ComponentRegistry::new();
        assert_eq!(registry.get_component_by_action("nope"), None);
    }

    #[test]
    fn list_preserves_insertion_order() {
        let registry = ComponentRegistry::new();
        registry.track_component("c2", "page", empty_metadata());
        registry.track_component("c1", "page", empty_metadata());
        let ids: Vec<_> = registry.list().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["c2".to_string(), "c1".to_string()]);
    }
}
