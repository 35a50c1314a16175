//! # modelclay
//!
//! A schema compiler for clinical data models. Modelers assemble typed
//! components from a closed catalogue (boolean, text, quantity, interval,
//! cluster, entry and friends), publish them to assign immutable
//! identities, and compile a root entity into a self-contained schema
//! document plus a synthesized example instance.
//!
//! ## Quick start
//!
//! ```
//! use modelclay::{
//!     BooleanLeaf, ClusterDef, Component, DataModelDef, EntryDef,
//!     MemoryComponentStore, PartyDef, Publisher,
//! };
//!
//! let store = MemoryComponentStore::new();
//! let publisher = Publisher::new(&store);
//!
//! let smoker = publisher
//!     .publish(store.insert_draft(Component::Boolean(BooleanLeaf::new("Smoker"))))
//!     .unwrap();
//! let lifestyle = publisher
//!     .publish(store.insert_draft(Component::Cluster(
//!         ClusterDef::new("Lifestyle").with_member(smoker),
//!     )))
//!     .unwrap();
//! let patient = publisher
//!     .publish(store.insert_draft(Component::Party(PartyDef::new("Patient"))))
//!     .unwrap();
//! let clinic = publisher
//!     .publish(store.insert_draft(Component::Party(PartyDef::new("Clinic"))))
//!     .unwrap();
//! let entry = publisher
//!     .publish(store.insert_draft(Component::Entry(
//!         EntryDef::new("Intake")
//!             .with_payload(lifestyle)
//!             .with_subject(patient)
//!             .with_provider(clinic),
//!     )))
//!     .unwrap();
//!
//! let model = DataModelDef::new("Lifestyle Record", "1.0.0").with_entry(entry);
//! let handle = store.insert_draft(Component::DataModel(model));
//! let output = publisher.publish_model(handle).unwrap();
//!
//! println!("{}", output.document.render());
//! println!("{}", output.instance.render());
//! ```

pub mod assembler;
pub mod catalogue;
pub mod error;
pub mod publish;
pub mod registry;
pub mod store;
pub mod synthesizer;
pub mod walker;

pub use assembler::{Document, DocumentAssembler, Fragment, Node};
pub use catalogue::{
    Annotation, AttestationDef, AuditDef, BlobLeaf, BooleanLeaf, ChangeType, ClusterDef,
    Component, ComponentKind, ComponentMeta, CountLeaf, DataModelDef, DurationKind, EmitContext,
    EntryDef, Identity, IntervalBound, IntervalDef, IntervalKind, LifecycleState, LinkLeaf,
    NumericBound, Occurrence, OrdinalLeaf, ParticipationDef, PartyDef, QuantityLeaf, RatioLeaf,
    ReferenceRange, Slot, SlotExpectation, SlotReference, TemporalLeaf, TextConstraint, TextLeaf,
    UnitsDef,
};
pub use error::{CompileError, FieldError, GenerationWarning, Result};
pub use publish::{PublishOutput, Publisher};
pub use registry::{IdentityRegistry, RoleSet, SlotRole};
pub use store::{DraftHandle, MemoryComponentStore};
pub use synthesizer::{ExampleInstance, InstanceSynthesizer};
pub use walker::{CompilerConfig, ComponentStore, GraphWalker, WalkResult, WalkStats};
