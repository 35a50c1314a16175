//! Shared emission helpers. Each variant builds its definition through
//! these so every restriction lists the common fields in the same fixed
//! order: label, exceptional-value, valid-time-begin/end, recorded,
//! modified, location, then the variant-specific fields.

use crate::assembler::{Fragment, Node};
use crate::catalogue::{ComponentMeta, Identity, Slot};
use crate::walker::ComponentStore;

/// Read-only view over already-published components, used while emitting a
/// fragment to resolve referenced identities into element names. Emission
/// is pure: the walker has verified every reference is published before a
/// fragment is requested.
pub struct EmitContext<'a> {
    store: &'a dyn ComponentStore,
}

impl<'a> EmitContext<'a> {
    pub fn new(store: &'a dyn ComponentStore) -> Self {
        Self { store }
    }

    /// Element name of a referenced published component. Falls back to a
    /// bare identity reference for names the store cannot resolve; the
    /// walker reports those as dependency errors before assembly.
    pub fn element_name(&self, identity: &Identity) -> String {
        match self.store.get(identity) {
            Some(component) => component.meta().element_name(),
            None => format!("ref.{}", identity.short()),
        }
    }

    pub fn adapter_name(&self, identity: &Identity) -> String {
        adapter_name(&self.element_name(identity))
    }
}

pub fn adapter_name(element_name: &str) -> String {
    format!("{element_name}.slot")
}

/// `xs:element` shell around a variant body: annotation, then a
/// complexType sequence of the common slots followed by the body.
pub fn definition(meta: &ComponentMeta, body: Vec<Node>) -> Node {
    let mut sequence = Node::new("xs:sequence").child(
        Node::new("xs:element")
            .attr("name", "label")
            .attr("type", "xs:string")
            .attr("fixed", &meta.label),
    );
    for slot in Slot::COMMON {
        sequence.push(slot_element(meta, slot));
    }
    for node in body {
        sequence.push(node);
    }

    let mut element = Node::new("xs:element").attr("name", meta.element_name());
    let mut annotation = Node::new("xs:annotation");
    if let Some(description) = &meta.description {
        annotation.push(Node::new("xs:documentation").text(description));
    }
    if let Some(identity) = &meta.identity {
        annotation.push(
            Node::new("xs:appinfo").child(Node::new("identity").text(identity.urn())),
        );
    }
    if !annotation.children.is_empty() {
        element.push(annotation);
    }
    element.push(Node::new("xs:complexType").child(sequence));
    element
}

fn slot_element(meta: &ComponentMeta, slot: Slot) -> Node {
    let occurrence = meta.occurrence(slot);
    let slot_type = match slot {
        Slot::ValidTimeBegin | Slot::ValidTimeEnd | Slot::Recorded | Slot::Modified => {
            "xs:dateTime"
        }
        _ => "xs:string",
    };
    Node::new("xs:element")
        .attr("name", slot.element_name())
        .attr("type", slot_type)
        .attr("minOccurs", occurrence.min.to_string())
        .attr("maxOccurs", occurrence.max_attr())
}

/// Adapter definition wrapping occurrences of the component for use
/// inside a Cluster.
pub fn adapter(meta: &ComponentMeta) -> Node {
    let name = meta.element_name();
    let occurrence = meta.occurrence(Slot::Occurrences);
    Node::new("xs:element").attr("name", adapter_name(&name)).child(
        Node::new("xs:complexType").child(
            Node::new("xs:sequence").child(
                Node::new("xs:element")
                    .attr("ref", name)
                    .attr("minOccurs", occurrence.min.to_string())
                    .attr("maxOccurs", occurrence.max_attr()),
            ),
        ),
    )
}

/// Leaf fragment: primary definition plus its Cluster adapter.
pub fn leaf_fragment(meta: &ComponentMeta, body: Vec<Node>) -> Fragment {
    Fragment::new(definition(meta, body)).with_adapter(adapter(meta))
}

/// Reference to another published component's definition.
pub fn reference(ctx: &EmitContext<'_>, identity: &Identity) -> Node {
    Node::new("xs:element").attr("ref", ctx.element_name(identity))
}

/// 0..* references to the reference ranges of a quantified leaf, honoring
/// the owner's ReferenceRanges cardinality override.
pub fn reference_range_refs(
    ctx: &EmitContext<'_>,
    meta: &ComponentMeta,
    ranges: &[Identity],
) -> Vec<Node> {
    let occurrence = meta.occurrence(Slot::ReferenceRanges);
    ranges
        .iter()
        .map(|identity| {
            Node::new("xs:element")
                .attr("ref", ctx.element_name(identity))
                .attr("minOccurs", occurrence.min.to_string())
                .attr("maxOccurs", occurrence.max_attr())
        })
        .collect()
}

/// simpleType restriction over a base type with the given facets.
pub fn restricted_value(name: &str, base: &str, facets: Vec<Node>) -> Node {
    Node::new("xs:element").attr("name", name).child(
        Node::new("xs:simpleType")
            .child(Node::new("xs:restriction").attr("base", base).children(facets)),
    )
}

pub fn facet(name: &str, value: impl Into<String>) -> Node {
    Node::new(name).attr("value", value)
}
