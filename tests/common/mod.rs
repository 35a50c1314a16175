use std::collections::{HashMap, HashSet};

use modelclay::*;

/// Store stub that lets tests wire arbitrary reference graphs, including
/// cycles the publish order would normally make impossible to build.
#[allow(dead_code)]
#[derive(Default)]
pub struct StubStore {
    components: HashMap<Identity, Component>,
    unpublished: HashSet<Identity>,
}

#[allow(dead_code)]
impl StubStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component as published under a freshly minted identity.
    pub fn add(&mut self, mut component: Component) -> Identity {
        let identity = Identity::mint();
        component.meta_mut().identity = Some(identity);
        component.meta_mut().locked = true;
        self.components.insert(identity, component);
        identity
    }

    /// Insert a component under a caller-chosen identity, so tests can
    /// mint identities up front and wire cycles.
    pub fn add_with_identity(&mut self, identity: Identity, mut component: Component) {
        component.meta_mut().identity = Some(identity);
        component.meta_mut().locked = true;
        self.components.insert(identity, component);
    }

    /// Insert a component that resolves but is still a draft.
    pub fn add_unpublished(&mut self, mut component: Component) -> Identity {
        let identity = Identity::mint();
        component.meta_mut().identity = Some(identity);
        self.components.insert(identity, component);
        self.unpublished.insert(identity);
        identity
    }
}

impl ComponentStore for StubStore {
    fn get(&self, identity: &Identity) -> Option<Component> {
        self.components.get(identity).cloned()
    }

    fn is_published(&self, identity: &Identity) -> bool {
        self.components.contains_key(identity) && !self.unpublished.contains(identity)
    }
}

#[allow(dead_code)]
pub fn create_test_units(unit: &str) -> Component {
    Component::Units(UnitsDef::new(format!("{unit} units"), unit))
}

#[allow(dead_code)]
pub fn create_test_boolean(label: &str) -> Component {
    Component::Boolean(BooleanLeaf::new(label))
}

#[allow(dead_code)]
pub fn create_test_cluster(label: &str, members: &[Identity]) -> Component {
    let mut cluster = ClusterDef::new(label);
    for member in members {
        cluster = cluster.with_member(*member);
    }
    Component::Cluster(cluster)
}

/// Publish the minimal entourage an entry needs and return the published
/// entry identity.
#[allow(dead_code)]
pub fn publish_test_entry(
    store: &MemoryComponentStore,
    publisher: &Publisher<'_>,
    payload: Identity,
) -> Identity {
    let subject = publisher
        .publish(store.insert_draft(Component::Party(PartyDef::new("Subject"))))
        .unwrap();
    let provider = publisher
        .publish(store.insert_draft(Component::Party(PartyDef::new("Provider"))))
        .unwrap();
    publisher
        .publish(store.insert_draft(Component::Entry(
            EntryDef::new("Entry")
                .with_payload(payload)
                .with_subject(subject)
                .with_provider(provider),
        )))
        .unwrap()
}

/// Walk a published data-model root fetched back from the store.
#[allow(dead_code)]
pub fn walk_root(store: &MemoryComponentStore, identity: Identity) -> WalkResult {
    let root = store.get(&identity).unwrap();
    GraphWalker::new(store).walk(&root).unwrap()
}
