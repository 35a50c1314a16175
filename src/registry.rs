//! Per-compilation identity registry. This is the mechanism behind the
//! at-most-one-definition guarantee: however many paths reach an
//! identity during a walk, only the first registration triggers fragment
//! emission; later registrations merely widen the identity's role set.
//!
//! The registry is scratch state owned by a single walk. It is created
//! with the walk, threaded through it as a value, and dropped with the
//! result, so independent compilations can never see each other's state.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalogue::{ComponentKind, Identity};

/// Usage context an identity must support in the assembled document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SlotRole {
    /// Referenced directly from an entity slot.
    Standalone,
    /// Referenced as a member of a Cluster, through its adapter.
    InCluster,
}

impl SlotRole {
    pub fn name(&self) -> &'static str {
        match self {
            SlotRole::Standalone => "standalone",
            SlotRole::InCluster => "in-cluster",
        }
    }
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    kind: ComponentKind,
    roles: BTreeSet<SlotRole>,
}

/// Accumulated role set for one registered identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSet {
    pub identity: Identity,
    pub kind: ComponentKind,
    pub roles: Vec<SlotRole>,
}

#[derive(Debug, Default)]
pub struct IdentityRegistry {
    entries: HashMap<Identity, RegistryEntry>,
    /// First-registration order; drives every ordered emission.
    order: Vec<Identity>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true exactly once per identity per compilation. Repeat
    /// registrations accumulate the extra role and return false, telling
    /// the walker to skip fragment collection.
    pub fn register(&mut self, identity: Identity, kind: ComponentKind, role: SlotRole) -> bool {
        match self.entries.get_mut(&identity) {
            Some(entry) => {
                let widened = entry.roles.insert(role);
                debug!(%identity, kind = %kind, role = role.name(), widened, "repeat registration");
                false
            }
            None => {
                let mut roles = BTreeSet::new();
                roles.insert(role);
                self.entries.insert(identity, RegistryEntry { kind, roles });
                self.order.push(identity);
                debug!(%identity, kind = %kind, role = role.name(), "first registration");
                true
            }
        }
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Role sets in first-registration order. Only identities whose
    /// primary definition was emitted can appear here, because an entry
    /// is created by the same call that triggers emission.
    pub fn role_sets(&self) -> Vec<RoleSet> {
        self.order
            .iter()
            .map(|identity| {
                let entry = &self.entries[identity];
                RoleSet {
                    identity: *identity,
                    kind: entry.kind,
                    roles: entry.roles.iter().copied().collect(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registration_wins_once() {
        let mut registry = IdentityRegistry::new();
        let identity = Identity::mint();
        assert!(registry.register(identity, ComponentKind::Count, SlotRole::InCluster));
        assert!(!registry.register(identity, ComponentKind::Count, SlotRole::InCluster));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn repeat_registrations_accumulate_roles() {
        let mut registry = IdentityRegistry::new();
        let identity = Identity::mint();
        registry.register(identity, ComponentKind::Units, SlotRole::InCluster);
        registry.register(identity, ComponentKind::Units, SlotRole::Standalone);

        let role_sets = registry.role_sets();
        assert_eq!(role_sets.len(), 1);
        assert_eq!(
            role_sets[0].roles,
            vec![SlotRole::Standalone, SlotRole::InCluster]
        );
    }

    #[test]
    fn role_sets_follow_registration_order() {
        let mut registry = IdentityRegistry::new();
        let first = Identity::mint();
        let second = Identity::mint();
        registry.register(first, ComponentKind::Text, SlotRole::InCluster);
        registry.register(second, ComponentKind::Cluster, SlotRole::Standalone);
        registry.register(first, ComponentKind::Text, SlotRole::Standalone);

        let order: Vec<Identity> = registry.role_sets().iter().map(|r| r.identity).collect();
        assert_eq!(order, vec![first, second]);
    }
}
