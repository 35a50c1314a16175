//! Publish state machine. A component lives as a mutable Draft until it is
//! published, at which point it is assigned an identity, its fragment is
//! emitted and cached, and the snapshot becomes immutable. A reset retires
//! the identity permanently and returns the component to Draft.

use tracing::info;

use crate::assembler::{Document, DocumentAssembler};
use crate::catalogue::emit::EmitContext;
use crate::catalogue::{Component, Identity};
use crate::error::{CompileError, Result};
use crate::store::{DraftHandle, MemoryComponentStore};
use crate::synthesizer::{ExampleInstance, InstanceSynthesizer};
use crate::walker::{CompilerConfig, ComponentStore, GraphWalker};

/// Everything a model publish produces for downstream packaging.
#[derive(Debug)]
pub struct PublishOutput {
    pub identity: Identity,
    pub document: Document,
    pub instance: ExampleInstance,
}

pub struct Publisher<'a> {
    store: &'a MemoryComponentStore,
    config: CompilerConfig,
}

impl<'a> Publisher<'a> {
    pub fn new(store: &'a MemoryComponentStore) -> Self {
        Self {
            store,
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(store: &'a MemoryComponentStore, config: CompilerConfig) -> Self {
        Self { store, config }
    }

    /// Publish a single draft. All components it references must already be
    /// published; leaves have no references and publish freely. On any error
    /// the draft is left untouched.
    pub fn publish(&self, handle: DraftHandle) -> Result<Identity> {
        let component = self.prepare(handle)?;
        let identity = self.store.commit_publish(handle, component)?;
        info!(%identity, "component published");
        Ok(identity)
    }

    /// Publish a root component and compile the full model artefacts: the
    /// assembled schema document and a synthesized example instance. Nothing
    /// is committed to the store unless the whole compilation succeeds.
    pub fn publish_model(&self, handle: DraftHandle) -> Result<PublishOutput> {
        let mut component = self.prepare(handle)?;
        let walker = GraphWalker::with_config(self.store, self.config.clone());
        let walk = walker.walk(&component)?;
        let document = DocumentAssembler::new().assemble(&walk);
        document.validate_structure()?;
        let instance = InstanceSynthesizer::with_config(self.store, self.config.clone())
            .synthesize(&component);
        component.meta_mut().fragment = Some(walk.root_fragment.clone());
        let identity = self.store.commit_publish(handle, component)?;
        info!(
            %identity,
            definitions = walk.fragments.len() + 1,
            warnings = instance.warnings.len(),
            "model published"
        );
        Ok(PublishOutput {
            identity,
            document,
            instance,
        })
    }

    /// Retire a published component's identity and hand back a fresh draft
    /// handle. The retired identity can never be assigned again.
    pub fn reset(&self, identity: Identity) -> Result<DraftHandle> {
        let mut component = self.store.take_for_reset(identity)?;
        let handle = self.store.insert_draft({
            let meta = component.meta_mut();
            meta.identity = None;
            meta.fragment = None;
            meta.locked = false;
            component
        });
        info!(%identity, %handle, "component reset to draft");
        Ok(handle)
    }

    /// Validate the draft, check its dependencies and assign an identity,
    /// leaving the emitted fragment cached on the component. Nothing touches
    /// the store until the caller commits.
    fn prepare(&self, handle: DraftHandle) -> Result<Component> {
        let mut component = self
            .store
            .draft(handle)
            .ok_or(CompileError::UnknownDraft {
                handle: *handle.as_uuid(),
            })?;
        component
            .validate()
            .map_err(|source| CompileError::field(component.label(), source))?;
        for slot in component.typed_references() {
            let dependency =
                self.store
                    .get(&slot.identity)
                    .ok_or_else(|| CompileError::MissingDependency {
                        label: component.label().to_string(),
                        identity: slot.identity,
                    })?;
            if !slot.expected.admits(dependency.kind()) {
                return Err(CompileError::slot_mismatch(
                    component.label(),
                    &slot,
                    dependency.kind(),
                ));
            }
        }
        let identity = Identity::mint();
        component.meta_mut().identity = Some(identity);
        let fragment = component.emit_fragment(&EmitContext::new(self.store));
        let meta = component.meta_mut();
        meta.fragment = Some(fragment);
        meta.locked = true;
        Ok(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{BooleanLeaf, ClusterDef, LifecycleState, QuantityLeaf};

    #[test]
    fn publish_assigns_identity_and_locks() {
        let store = MemoryComponentStore::new();
        let handle = store.insert_draft(Component::Boolean(BooleanLeaf::new("Smoker")));
        let identity = Publisher::new(&store).publish(handle).unwrap();
        let published = store.get(&identity).unwrap();
        assert_eq!(published.identity(), Some(identity));
        assert_eq!(published.state(), LifecycleState::Published);
        assert!(published.meta().fragment.is_some());
        assert!(store.draft(handle).is_none());
    }

    #[test]
    fn publish_rejects_unpublished_dependency() {
        let store = MemoryComponentStore::new();
        let quantity = QuantityLeaf::new("Dose").with_units(Identity::mint());
        let handle = store.insert_draft(Component::Quantity(quantity));
        let result = Publisher::new(&store).publish(handle);
        assert!(matches!(result, Err(CompileError::MissingDependency { .. })));
        assert!(store.draft(handle).is_some(), "failed publish keeps the draft");
    }

    #[test]
    fn reset_retires_identity_and_returns_to_draft() {
        let store = MemoryComponentStore::new();
        let handle = store.insert_draft(Component::Boolean(BooleanLeaf::new("Smoker")));
        let publisher = Publisher::new(&store);
        let identity = publisher.publish(handle).unwrap();

        let fresh = publisher.reset(identity).unwrap();
        assert!(store.get(&identity).is_none());
        assert!(store.is_retired(&identity));
        let draft = store.draft(fresh).unwrap();
        assert!(draft.identity().is_none());
        assert!(draft.meta().fragment.is_none());

        // Republishing mints a new identity, never the retired one.
        let republished = publisher.publish(fresh).unwrap();
        assert_ne!(republished, identity);

        assert!(matches!(
            publisher.reset(identity),
            Err(CompileError::RetiredIdentity { .. })
        ));
    }

    #[test]
    fn cluster_cannot_publish_before_its_members() {
        let store = MemoryComponentStore::new();
        let publisher = Publisher::new(&store);

        let member_handle = store.insert_draft(Component::Boolean(BooleanLeaf::new("Smoker")));
        let member = publisher.publish(member_handle).unwrap();
        let missing = Identity::mint();

        let cluster = ClusterDef::new("Habits").with_member(member).with_member(missing);
        let handle = store.insert_draft(Component::Cluster(cluster));
        let result = publisher.publish(handle);
        assert!(matches!(
            result,
            Err(CompileError::MissingDependency { identity, .. }) if identity == missing
        ));
    }
}
