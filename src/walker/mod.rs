//! Depth-first traversal of a root entity's reference graph. The walker
//! resolves every reference through the store, asks the registry whether
//! an identity has been seen before, and collects fragments
//! dependencies-first so the assembled document defines everything
//! before it is referenced.

mod store;

pub use store::ComponentStore;

use tracing::{debug, warn};

use crate::assembler::Fragment;
use crate::catalogue::{
    Annotation, Component, ComponentKind, EmitContext, Identity, SlotReference,
};
use crate::error::{CompileError, Result};
use crate::registry::{IdentityRegistry, SlotRole};

/// Policy knobs for one compilation.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Total recursive cluster visits allowed before the walk is treated
    /// as a suspected cycle or pathological nesting. A policy parameter,
    /// not an invariant.
    pub cluster_visit_ceiling: usize,
    /// Fallback sampling range for numeric leaves with no declared bound.
    pub sentinel_range: (f64, f64),
    /// Fixed RNG seed for deterministic instance synthesis.
    pub seed: Option<u64>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            cluster_visit_ceiling: 100,
            sentinel_range: (0.0, 1000.0),
            seed: None,
        }
    }
}

impl CompilerConfig {
    pub fn with_cluster_visit_ceiling(mut self, ceiling: usize) -> Self {
        self.cluster_visit_ceiling = ceiling;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Counters accumulated over one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub clusters_visited: usize,
    pub leaves_visited: usize,
    pub entities_visited: usize,
    pub dedup_hits: usize,
}

/// What the semantic-annotation block says about one registered identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticEntry {
    pub identity: Identity,
    pub label: String,
    pub description: Option<String>,
    pub annotations: Vec<Annotation>,
}

/// Everything the assembler and synthesizer need from one traversal.
#[derive(Debug)]
pub struct WalkResult {
    pub root_identity: Identity,
    pub root_label: String,
    pub root_fragment: Fragment,
    /// First-time fragments in visitation order, dependencies first.
    pub fragments: Vec<(Identity, Fragment)>,
    /// One entry per registered identity, root first, then fragment order.
    pub semantics: Vec<SemanticEntry>,
    pub registry: IdentityRegistry,
    pub stats: WalkStats,
}

pub struct GraphWalker<'a> {
    store: &'a dyn ComponentStore,
    config: CompilerConfig,
}

impl<'a> GraphWalker<'a> {
    pub fn new(store: &'a dyn ComponentStore) -> Self {
        Self {
            store,
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(store: &'a dyn ComponentStore, config: CompilerConfig) -> Self {
        Self { store, config }
    }

    /// Walk the graph below `root`. The root itself carries a freshly
    /// assigned identity but is not necessarily in the store yet; every
    /// component it reaches must already be published.
    pub fn walk(&self, root: &Component) -> Result<WalkResult> {
        let root_identity = require_identity(root)?;
        debug!(identity = %root_identity, label = root.label(), "starting walk");

        let mut walk = Walk {
            store: self.store,
            config: &self.config,
            registry: IdentityRegistry::new(),
            fragments: Vec::new(),
            semantics: Vec::new(),
            stats: WalkStats::default(),
            cluster_visits: 0,
        };

        walk.registry
            .register(root_identity, root.kind(), SlotRole::Standalone);
        walk.semantics.push(semantic_entry(root_identity, root));
        let mut ancestors = Vec::new();
        for slot in root.typed_references() {
            let component = walk.fetch_slot(root.label(), &slot)?;
            walk.visit(&component, SlotRole::Standalone, &mut ancestors)?;
        }
        let ctx = EmitContext::new(self.store);
        let root_fragment = root.emit_fragment(&ctx);

        debug!(
            identity = %root_identity,
            definitions = walk.fragments.len(),
            dedup_hits = walk.stats.dedup_hits,
            "walk finished"
        );
        Ok(WalkResult {
            root_identity,
            root_label: root.label().to_string(),
            root_fragment,
            fragments: walk.fragments,
            semantics: walk.semantics,
            registry: walk.registry,
            stats: walk.stats,
        })
    }
}

struct Walk<'a> {
    store: &'a dyn ComponentStore,
    config: &'a CompilerConfig,
    registry: IdentityRegistry,
    fragments: Vec<(Identity, Fragment)>,
    semantics: Vec<SemanticEntry>,
    stats: WalkStats,
    cluster_visits: usize,
}

impl<'a> Walk<'a> {
    fn fetch(&self, referrer: &str, identity: &Identity) -> Result<Component> {
        let component = self.store.get(identity).ok_or_else(|| {
            warn!(%identity, referrer, "reference to a component missing from the store");
            CompileError::MissingDependency {
                label: referrer.to_string(),
                identity: *identity,
            }
        })?;
        if !self.store.is_published(identity) {
            return Err(CompileError::UnpublishedDependency {
                label: referrer.to_string(),
                identity: *identity,
            });
        }
        Ok(component)
    }

    /// Fetch plus the slot's kind check; a published component of the
    /// wrong kind is as fatal as a missing one.
    fn fetch_slot(&self, referrer: &str, slot: &SlotReference) -> Result<Component> {
        let component = self.fetch(referrer, &slot.identity)?;
        if !slot.expected.admits(component.kind()) {
            return Err(CompileError::slot_mismatch(referrer, slot, component.kind()));
        }
        Ok(component)
    }

    fn visit(
        &mut self,
        component: &Component,
        role: SlotRole,
        ancestors: &mut Vec<Identity>,
    ) -> Result<()> {
        match component {
            Component::Cluster(cluster) => {
                let members = cluster.members.clone();
                self.visit_cluster(component, &members, role, ancestors)
            }
            _ => self.visit_plain(component, role, ancestors),
        }
    }

    /// Clusters get the cycle and ceiling guards. The ancestor check must
    /// run before the dedup skip: a repeat visit that closes a cycle is a
    /// modeling error, not a dedup hit.
    fn visit_cluster(
        &mut self,
        component: &Component,
        members: &[Identity],
        role: SlotRole,
        ancestors: &mut Vec<Identity>,
    ) -> Result<()> {
        let identity = require_identity(component)?;
        if ancestors.contains(&identity) {
            return Err(CompileError::SelfReferentialCluster {
                label: component.label().to_string(),
                identity,
            });
        }
        self.cluster_visits += 1;
        if self.cluster_visits > self.config.cluster_visit_ceiling {
            return Err(CompileError::NestingCeiling {
                visits: self.cluster_visits,
                ceiling: self.config.cluster_visit_ceiling,
            });
        }
        self.stats.clusters_visited += 1;

        if !self.registry.register(identity, ComponentKind::Cluster, role) {
            self.stats.dedup_hits += 1;
            return Ok(());
        }

        ancestors.push(identity);
        for member in members {
            let child = self.fetch(component.label(), member)?;
            match &child {
                Component::Cluster(nested) => {
                    let nested_members = nested.members.clone();
                    self.visit_cluster(&child, &nested_members, SlotRole::InCluster, ancestors)?;
                }
                other if other.kind().is_leaf() => {
                    self.visit_plain(&child, SlotRole::InCluster, ancestors)?;
                }
                other => {
                    return Err(CompileError::InvalidClusterMember {
                        label: component.label().to_string(),
                        identity: *member,
                        kind: other.kind().name().to_string(),
                    });
                }
            }
        }
        ancestors.pop();

        self.push_fragment(identity, component);
        Ok(())
    }

    /// Leaves and composite entities: register, then collect dependency
    /// fragments before the component's own.
    fn visit_plain(
        &mut self,
        component: &Component,
        role: SlotRole,
        ancestors: &mut Vec<Identity>,
    ) -> Result<()> {
        let identity = require_identity(component)?;
        if !self.registry.register(identity, component.kind(), role) {
            self.stats.dedup_hits += 1;
            return Ok(());
        }
        if component.kind().is_leaf() {
            self.stats.leaves_visited += 1;
        } else {
            self.stats.entities_visited += 1;
        }

        for slot in component.typed_references() {
            let dependency = self.fetch_slot(component.label(), &slot)?;
            self.visit(&dependency, SlotRole::Standalone, ancestors)?;
        }

        self.push_fragment(identity, component);
        Ok(())
    }

    fn push_fragment(&mut self, identity: Identity, component: &Component) {
        let ctx = EmitContext::new(self.store);
        // Prefer the fragment cached at publish time; it is identical to a
        // fresh emission because published components are immutable.
        let fragment = component
            .meta()
            .fragment
            .clone()
            .unwrap_or_else(|| component.emit_fragment(&ctx));
        self.fragments.push((identity, fragment));
        self.semantics.push(semantic_entry(identity, component));
    }
}

fn semantic_entry(identity: Identity, component: &Component) -> SemanticEntry {
    let meta = component.meta();
    SemanticEntry {
        identity,
        label: meta.label.clone(),
        description: meta.description.clone(),
        annotations: meta.annotations.clone(),
    }
}

fn require_identity(component: &Component) -> Result<Identity> {
    component
        .identity()
        .ok_or_else(|| CompileError::Publish {
            label: component.label().to_string(),
            message: "component has no identity; publish it first".to_string(),
        })
}
