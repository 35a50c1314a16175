//! In-memory component store. Drafts are keyed by an opaque handle and
//! stay mutable; published components are keyed by identity and are only
//! ever read after the publish commit, so readers always observe a fully
//! formed snapshot.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalogue::{Component, Identity};
use crate::error::{CompileError, FieldError, Result};
use crate::walker::ComponentStore;

/// Opaque key for a component that has not been published yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftHandle(Uuid);

impl DraftHandle {
    fn mint() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DraftHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Inner {
    drafts: HashMap<Uuid, Component>,
    published: HashMap<Identity, Component>,
    /// Identities invalidated by a reset; they can never be served again.
    retired: HashSet<Identity>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryComponentStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a draft. The component must not claim to be published already.
    pub fn insert_draft(&self, mut component: Component) -> DraftHandle {
        let meta = component.meta_mut();
        meta.identity = None;
        meta.fragment = None;
        meta.locked = false;
        let handle = DraftHandle::mint();
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.drafts.insert(handle.0, component);
        handle
    }

    pub fn draft(&self, handle: DraftHandle) -> Option<Component> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.drafts.get(&handle.0).cloned()
    }

    /// Edit a draft in place. Published components are not reachable here,
    /// which is what makes them immutable.
    pub fn update_draft(
        &self,
        handle: DraftHandle,
        edit: impl FnOnce(&mut Component) -> std::result::Result<(), FieldError>,
    ) -> Result<()> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let component = inner
            .drafts
            .get_mut(&handle.0)
            .ok_or(CompileError::UnknownDraft { handle: handle.0 })?;
        let label = component.label().to_string();
        component
            .meta()
            .ensure_mutable()
            .map_err(|source| CompileError::field(&label, source))?;
        edit(component).map_err(|source| CompileError::field(label, source))
    }

    pub fn draft_count(&self) -> usize {
        self.inner.read().expect("store lock poisoned").drafts.len()
    }

    pub fn published_count(&self) -> usize {
        self.inner.read().expect("store lock poisoned").published.len()
    }

    pub fn is_retired(&self, identity: &Identity) -> bool {
        self.inner
            .read()
            .expect("store lock poisoned")
            .retired
            .contains(identity)
    }

    /// Commit a publish: move the draft out and the published snapshot in,
    /// as one store mutation.
    pub(crate) fn commit_publish(
        &self,
        handle: DraftHandle,
        published: Component,
    ) -> Result<Identity> {
        let identity = published.identity().ok_or_else(|| CompileError::Publish {
            label: published.label().to_string(),
            message: "commit without an assigned identity".to_string(),
        })?;
        let mut inner = self.inner.write().expect("store lock poisoned");
        if inner.retired.contains(&identity) {
            return Err(CompileError::RetiredIdentity { identity });
        }
        if inner.drafts.remove(&handle.0).is_none() {
            return Err(CompileError::UnknownDraft { handle: handle.0 });
        }
        inner.published.insert(identity, published);
        Ok(identity)
    }

    /// Administrative reset: retire the identity forever and return the
    /// component to Draft with identity and fragment cleared.
    pub(crate) fn take_for_reset(&self, identity: Identity) -> Result<Component> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if inner.retired.contains(&identity) {
            return Err(CompileError::RetiredIdentity { identity });
        }
        let component = inner
            .published
            .remove(&identity)
            .ok_or(CompileError::MissingDependency {
                label: "reset".to_string(),
                identity,
            })?;
        inner.retired.insert(identity);
        Ok(component)
    }
}

impl ComponentStore for MemoryComponentStore {
    fn get(&self, identity: &Identity) -> Option<Component> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.published.get(identity).cloned()
    }

    fn is_published(&self, identity: &Identity) -> bool {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.published.contains_key(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::BooleanLeaf;

    #[test]
    fn drafts_are_not_visible_through_the_read_seam() {
        let store = MemoryComponentStore::new();
        let handle = store.insert_draft(Component::Boolean(BooleanLeaf::new("Smoker")));
        assert_eq!(store.draft_count(), 1);
        assert_eq!(store.published_count(), 0);
        assert!(store.draft(handle).is_some());
    }

    #[test]
    fn insert_draft_strips_any_claimed_publish_state() {
        let store = MemoryComponentStore::new();
        let mut component = Component::Boolean(BooleanLeaf::new("Smoker"));
        component.meta_mut().identity = Some(Identity::mint());
        component.meta_mut().locked = true;
        let handle = store.insert_draft(component);
        let draft = store.draft(handle).unwrap();
        assert!(draft.identity().is_none());
        assert!(!draft.meta().locked);
    }

    #[test]
    fn draft_claiming_publish_state_is_refused_edits() {
        let store = MemoryComponentStore::new();
        let handle = store.insert_draft(Component::Boolean(BooleanLeaf::new("Smoker")));
        store
            .update_draft(handle, |component| {
                component.meta_mut().locked = true;
                Ok(())
            })
            .unwrap();
        let result = store.update_draft(handle, |_| Ok(()));
        assert!(matches!(
            result,
            Err(CompileError::Field {
                source: FieldError::Immutable { .. },
                ..
            })
        ));
    }

    #[test]
    fn update_unknown_draft_fails() {
        let store = MemoryComponentStore::new();
        let result = store.update_draft(DraftHandle::mint(), |_| Ok(()));
        assert!(matches!(result, Err(CompileError::UnknownDraft { .. })));
    }
}
