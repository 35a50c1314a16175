//! The closed component catalogue: every typed building block a modeler
//! can publish, as one tagged union. Validation is exhaustive pattern
//! matching over the variant set, so a new variant cannot be added
//! without also deciding its rules.

mod cluster;
pub mod emit;
mod entity;
mod meta;
mod quantified;
mod range;
mod scalar;
mod text;

pub use cluster::ClusterDef;
pub use emit::EmitContext;
pub use entity::{
    AttestationDef, AuditDef, ChangeType, DataModelDef, EntryDef, ParticipationDef, PartyDef,
};
pub use meta::{
    Annotation, ComponentMeta, Identity, LifecycleState, Occurrence, Slot, sanitize_label,
};
pub use quantified::{
    CountLeaf, DurationKind, NumericBound, OrdinalLeaf, QuantityLeaf, RatioLeaf, TemporalLeaf,
    trim_float,
};
pub use range::{IntervalBound, IntervalDef, IntervalKind, ReferenceRange};
pub use scalar::{BlobLeaf, BooleanLeaf, LinkLeaf};
pub use text::{TextConstraint, TextLeaf, UnitsDef};

use serde::{Deserialize, Serialize};

use crate::assembler::Fragment;
use crate::error::FieldError;

/// Which catalogue variant an identity belongs to; recorded by the
/// registry and echoed into the substitution-group section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    Boolean,
    Text,
    Link,
    Count,
    Quantity,
    Ratio,
    Ordinal,
    Temporal,
    Blob,
    Units,
    ReferenceRange,
    Interval,
    Cluster,
    Party,
    Audit,
    Attestation,
    Participation,
    Entry,
    DataModel,
}

impl ComponentKind {
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Boolean => "boolean",
            ComponentKind::Text => "text",
            ComponentKind::Link => "link",
            ComponentKind::Count => "count",
            ComponentKind::Quantity => "quantity",
            ComponentKind::Ratio => "ratio",
            ComponentKind::Ordinal => "ordinal",
            ComponentKind::Temporal => "temporal",
            ComponentKind::Blob => "blob",
            ComponentKind::Units => "units",
            ComponentKind::ReferenceRange => "reference-range",
            ComponentKind::Interval => "interval",
            ComponentKind::Cluster => "cluster",
            ComponentKind::Party => "party",
            ComponentKind::Audit => "audit",
            ComponentKind::Attestation => "attestation",
            ComponentKind::Participation => "participation",
            ComponentKind::Entry => "entry",
            ComponentKind::DataModel => "data-model",
        }
    }

    /// Leaf variants are the ones a Cluster may contain directly.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            ComponentKind::Boolean
                | ComponentKind::Text
                | ComponentKind::Link
                | ComponentKind::Count
                | ComponentKind::Quantity
                | ComponentKind::Ratio
                | ComponentKind::Ordinal
                | ComponentKind::Temporal
                | ComponentKind::Blob
        )
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a typed reference slot accepts once the identity is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotExpectation {
    /// Exactly one catalogue kind.
    Kind(ComponentKind),
    /// Any leaf kind or a nested cluster.
    ClusterMember,
}

impl SlotExpectation {
    pub fn admits(&self, kind: ComponentKind) -> bool {
        match self {
            SlotExpectation::Kind(expected) => *expected == kind,
            SlotExpectation::ClusterMember => kind.is_leaf() || kind == ComponentKind::Cluster,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            SlotExpectation::Kind(kind) => kind.name(),
            SlotExpectation::ClusterMember => "leaf or cluster",
        }
    }
}

/// One outgoing reference together with the slot it fills and the kind
/// that slot accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotReference {
    pub slot: &'static str,
    pub identity: Identity,
    pub expected: SlotExpectation,
}

/// One independently publishable unit of the reference model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "kebab-case")]
pub enum Component {
    Boolean(BooleanLeaf),
    Text(TextLeaf),
    Link(LinkLeaf),
    Count(CountLeaf),
    Quantity(QuantityLeaf),
    Ratio(RatioLeaf),
    Ordinal(OrdinalLeaf),
    Temporal(TemporalLeaf),
    Blob(BlobLeaf),
    Units(UnitsDef),
    ReferenceRange(ReferenceRange),
    Interval(IntervalDef),
    Cluster(ClusterDef),
    Party(PartyDef),
    Audit(AuditDef),
    Attestation(AttestationDef),
    Participation(ParticipationDef),
    Entry(EntryDef),
    DataModel(DataModelDef),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Boolean(_) => ComponentKind::Boolean,
            Component::Text(_) => ComponentKind::Text,
            Component::Link(_) => ComponentKind::Link,
            Component::Count(_) => ComponentKind::Count,
            Component::Quantity(_) => ComponentKind::Quantity,
            Component::Ratio(_) => ComponentKind::Ratio,
            Component::Ordinal(_) => ComponentKind::Ordinal,
            Component::Temporal(_) => ComponentKind::Temporal,
            Component::Blob(_) => ComponentKind::Blob,
            Component::Units(_) => ComponentKind::Units,
            Component::ReferenceRange(_) => ComponentKind::ReferenceRange,
            Component::Interval(_) => ComponentKind::Interval,
            Component::Cluster(_) => ComponentKind::Cluster,
            Component::Party(_) => ComponentKind::Party,
            Component::Audit(_) => ComponentKind::Audit,
            Component::Attestation(_) => ComponentKind::Attestation,
            Component::Participation(_) => ComponentKind::Participation,
            Component::Entry(_) => ComponentKind::Entry,
            Component::DataModel(_) => ComponentKind::DataModel,
        }
    }

    pub fn meta(&self) -> &ComponentMeta {
        match self {
            Component::Boolean(c) => &c.meta,
            Component::Text(c) => &c.meta,
            Component::Link(c) => &c.meta,
            Component::Count(c) => &c.meta,
            Component::Quantity(c) => &c.meta,
            Component::Ratio(c) => &c.meta,
            Component::Ordinal(c) => &c.meta,
            Component::Temporal(c) => &c.meta,
            Component::Blob(c) => &c.meta,
            Component::Units(c) => &c.meta,
            Component::ReferenceRange(c) => &c.meta,
            Component::Interval(c) => &c.meta,
            Component::Cluster(c) => &c.meta,
            Component::Party(c) => &c.meta,
            Component::Audit(c) => &c.meta,
            Component::Attestation(c) => &c.meta,
            Component::Participation(c) => &c.meta,
            Component::Entry(c) => &c.meta,
            Component::DataModel(c) => &c.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut ComponentMeta {
        match self {
            Component::Boolean(c) => &mut c.meta,
            Component::Text(c) => &mut c.meta,
            Component::Link(c) => &mut c.meta,
            Component::Count(c) => &mut c.meta,
            Component::Quantity(c) => &mut c.meta,
            Component::Ratio(c) => &mut c.meta,
            Component::Ordinal(c) => &mut c.meta,
            Component::Temporal(c) => &mut c.meta,
            Component::Blob(c) => &mut c.meta,
            Component::Units(c) => &mut c.meta,
            Component::ReferenceRange(c) => &mut c.meta,
            Component::Interval(c) => &mut c.meta,
            Component::Cluster(c) => &mut c.meta,
            Component::Party(c) => &mut c.meta,
            Component::Audit(c) => &mut c.meta,
            Component::Attestation(c) => &mut c.meta,
            Component::Participation(c) => &mut c.meta,
            Component::Entry(c) => &mut c.meta,
            Component::DataModel(c) => &mut c.meta,
        }
    }

    pub fn label(&self) -> &str {
        &self.meta().label
    }

    pub fn identity(&self) -> Option<Identity> {
        self.meta().identity
    }

    pub fn state(&self) -> LifecycleState {
        self.meta().state()
    }

    /// Local invariants only; cross-component rules belong to the walker.
    pub fn validate(&self) -> Result<(), FieldError> {
        match self {
            Component::Boolean(c) => c.validate(),
            Component::Text(c) => c.validate(),
            Component::Link(c) => c.validate(),
            Component::Count(c) => c.validate(),
            Component::Quantity(c) => c.validate(),
            Component::Ratio(c) => c.validate(),
            Component::Ordinal(c) => c.validate(),
            Component::Temporal(c) => c.validate(),
            Component::Blob(c) => c.validate(),
            Component::Units(c) => c.validate(),
            Component::ReferenceRange(c) => c.validate(),
            Component::Interval(c) => c.validate(),
            Component::Cluster(c) => c.validate(),
            Component::Party(c) => c.validate(),
            Component::Audit(c) => c.validate(),
            Component::Attestation(c) => c.validate(),
            Component::Participation(c) => c.validate(),
            Component::Entry(c) => c.validate(),
            Component::DataModel(c) => c.validate(),
        }
    }

    /// Pure function of this component's state plus referenced published
    /// components reachable through the context.
    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        match self {
            Component::Boolean(c) => c.emit_fragment(ctx),
            Component::Text(c) => c.emit_fragment(ctx),
            Component::Link(c) => c.emit_fragment(ctx),
            Component::Count(c) => c.emit_fragment(ctx),
            Component::Quantity(c) => c.emit_fragment(ctx),
            Component::Ratio(c) => c.emit_fragment(ctx),
            Component::Ordinal(c) => c.emit_fragment(ctx),
            Component::Temporal(c) => c.emit_fragment(ctx),
            Component::Blob(c) => c.emit_fragment(ctx),
            Component::Units(c) => c.emit_fragment(ctx),
            Component::ReferenceRange(c) => c.emit_fragment(ctx),
            Component::Interval(c) => c.emit_fragment(ctx),
            Component::Cluster(c) => c.emit_fragment(ctx),
            Component::Party(c) => c.emit_fragment(ctx),
            Component::Audit(c) => c.emit_fragment(ctx),
            Component::Attestation(c) => c.emit_fragment(ctx),
            Component::Participation(c) => c.emit_fragment(ctx),
            Component::Entry(c) => c.emit_fragment(ctx),
            Component::DataModel(c) => c.emit_fragment(ctx),
        }
    }

    /// Every component identity this one references directly, in the order
    /// they appear in the emitted definition.
    pub fn references(&self) -> Vec<Identity> {
        self.typed_references()
            .into_iter()
            .map(|slot| slot.identity)
            .collect()
    }

    /// The same references with their slot names and expected kinds, for
    /// callers that resolve them and check what they point at.
    pub fn typed_references(&self) -> Vec<SlotReference> {
        let mut slots = Vec::new();
        match self {
            Component::Boolean(_)
            | Component::Text(_)
            | Component::Link(_)
            | Component::Blob(_)
            | Component::Units(_)
            | Component::Interval(_) => {}
            Component::Count(c) => {
                push_slot(&mut slots, "units", c.units, ComponentKind::Units);
                push_each(
                    &mut slots,
                    "reference-range",
                    &c.reference_ranges,
                    ComponentKind::ReferenceRange,
                );
            }
            Component::Quantity(c) => {
                push_slot(&mut slots, "units", c.units, ComponentKind::Units);
                push_each(
                    &mut slots,
                    "reference-range",
                    &c.reference_ranges,
                    ComponentKind::ReferenceRange,
                );
            }
            Component::Ratio(c) => {
                push_slot(&mut slots, "numerator-units", c.numerator_units, ComponentKind::Units);
                push_slot(
                    &mut slots,
                    "denominator-units",
                    c.denominator_units,
                    ComponentKind::Units,
                );
                push_slot(&mut slots, "ratio-units", c.ratio_units, ComponentKind::Units);
                push_each(
                    &mut slots,
                    "reference-range",
                    &c.reference_ranges,
                    ComponentKind::ReferenceRange,
                );
            }
            Component::Ordinal(c) => push_each(
                &mut slots,
                "reference-range",
                &c.reference_ranges,
                ComponentKind::ReferenceRange,
            ),
            Component::Temporal(c) => push_each(
                &mut slots,
                "reference-range",
                &c.reference_ranges,
                ComponentKind::ReferenceRange,
            ),
            Component::ReferenceRange(c) => {
                push_slot(&mut slots, "interval", c.interval, ComponentKind::Interval);
            }
            Component::Cluster(c) => {
                for member in &c.members {
                    slots.push(SlotReference {
                        slot: "member",
                        identity: *member,
                        expected: SlotExpectation::ClusterMember,
                    });
                }
            }
            Component::Party(c) => {
                push_slot(&mut slots, "details", c.details, ComponentKind::Cluster);
            }
            Component::Audit(c) => {
                push_slot(&mut slots, "committer", c.committer, ComponentKind::Party);
            }
            Component::Attestation(c) => {
                push_slot(&mut slots, "attester", c.attester, ComponentKind::Party);
            }
            Component::Participation(c) => {
                push_slot(&mut slots, "performer", c.performer, ComponentKind::Party);
            }
            Component::Entry(c) => {
                push_slot(&mut slots, "payload", c.payload, ComponentKind::Cluster);
                push_slot(&mut slots, "subject", c.subject, ComponentKind::Party);
                push_slot(&mut slots, "provider", c.provider, ComponentKind::Party);
                push_each(
                    &mut slots,
                    "participation",
                    &c.participations,
                    ComponentKind::Participation,
                );
                push_slot(&mut slots, "protocol", c.protocol, ComponentKind::Cluster);
                push_slot(&mut slots, "audit", c.audit, ComponentKind::Audit);
                push_slot(&mut slots, "attestation", c.attestation, ComponentKind::Attestation);
            }
            Component::DataModel(c) => {
                push_slot(&mut slots, "entry", c.entry, ComponentKind::Entry);
            }
        }
        slots
    }

    /// Mutable view of the same references, for callers that relink a
    /// component set, e.g. when loading a model description whose file-local
    /// ids must be swapped for published identities.
    pub fn references_mut(&mut self) -> Vec<&mut Identity> {
        match self {
            Component::Boolean(_)
            | Component::Text(_)
            | Component::Link(_)
            | Component::Blob(_)
            | Component::Units(_)
            | Component::Interval(_) => Vec::new(),
            Component::Count(c) => chain_mut(&mut c.units, &mut c.reference_ranges),
            Component::Quantity(c) => chain_mut(&mut c.units, &mut c.reference_ranges),
            Component::Ratio(c) => c
                .numerator_units
                .iter_mut()
                .chain(c.denominator_units.iter_mut())
                .chain(c.ratio_units.iter_mut())
                .chain(c.reference_ranges.iter_mut())
                .collect(),
            Component::Ordinal(c) => c.reference_ranges.iter_mut().collect(),
            Component::Temporal(c) => c.reference_ranges.iter_mut().collect(),
            Component::ReferenceRange(c) => c.interval.iter_mut().collect(),
            Component::Cluster(c) => c.members.iter_mut().collect(),
            Component::Party(c) => c.details.iter_mut().collect(),
            Component::Audit(c) => c.committer.iter_mut().collect(),
            Component::Attestation(c) => c.attester.iter_mut().collect(),
            Component::Participation(c) => c.performer.iter_mut().collect(),
            Component::Entry(c) => c
                .payload
                .iter_mut()
                .chain(c.subject.iter_mut())
                .chain(c.provider.iter_mut())
                .chain(c.participations.iter_mut())
                .chain(c.protocol.iter_mut())
                .chain(c.audit.iter_mut())
                .chain(c.attestation.iter_mut())
                .collect(),
            Component::DataModel(c) => c.entry.iter_mut().collect(),
        }
    }
}

fn push_slot(
    slots: &mut Vec<SlotReference>,
    slot: &'static str,
    identity: Option<Identity>,
    expected: ComponentKind,
) {
    if let Some(identity) = identity {
        slots.push(SlotReference {
            slot,
            identity,
            expected: SlotExpectation::Kind(expected),
        });
    }
}

fn push_each(
    slots: &mut Vec<SlotReference>,
    slot: &'static str,
    identities: &[Identity],
    expected: ComponentKind,
) {
    for identity in identities {
        slots.push(SlotReference {
            slot,
            identity: *identity,
            expected: SlotExpectation::Kind(expected),
        });
    }
}

fn chain_mut<'a>(
    first: &'a mut Option<Identity>,
    rest: &'a mut [Identity],
) -> Vec<&'a mut Identity> {
    first.iter_mut().chain(rest.iter_mut()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_serde() {
        let json = serde_json::to_string(&ComponentKind::ReferenceRange).unwrap();
        assert_eq!(json, "\"reference-range\"");
        let back: ComponentKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ComponentKind::ReferenceRange);
    }

    #[test]
    fn component_serde_is_tagged_by_variant() {
        let component = Component::Boolean(BooleanLeaf::new("Smoker"));
        let json = serde_json::to_value(&component).unwrap();
        assert_eq!(json["variant"], "boolean");
        let back: Component = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), ComponentKind::Boolean);
    }

    #[test]
    fn references_follow_definition_order() {
        let units = Identity::mint();
        let range = Identity::mint();
        let count = CountLeaf::new("Episodes")
            .with_units(units)
            .with_reference_range(range);
        assert_eq!(Component::Count(count).references(), vec![units, range]);
    }

    #[test]
    fn typed_references_carry_the_slot_kind() {
        let units = Identity::mint();
        let count = CountLeaf::new("Episodes").with_units(units);
        let slots = Component::Count(count).typed_references();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].slot, "units");
        assert!(slots[0].expected.admits(ComponentKind::Units));
        assert!(!slots[0].expected.admits(ComponentKind::Boolean));
    }

    #[test]
    fn cluster_member_slots_admit_leaves_and_clusters_only() {
        let expectation = SlotExpectation::ClusterMember;
        assert!(expectation.admits(ComponentKind::Quantity));
        assert!(expectation.admits(ComponentKind::Cluster));
        assert!(!expectation.admits(ComponentKind::Party));
        assert!(!expectation.admits(ComponentKind::Entry));
    }
}
