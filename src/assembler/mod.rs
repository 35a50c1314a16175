//! Assembles one walk's collected fragments into the final schema
//! document: header, root definition, per-identity definitions in
//! visitation order, the substitution-group section derived from the
//! registry's role sets, and the semantic-annotation block.

mod fragment;

pub use fragment::{Fragment, Node};

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CompileError, Result};
use crate::walker::WalkResult;

/// The assembled schema document. Kept structured until rendered; the
/// section order is fixed and every identity reached during the walk is
/// defined exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub header: Node,
    pub root_definition: Node,
    pub definitions: Vec<Node>,
    pub substitution_groups: Node,
    pub semantics: Node,
}

impl Document {
    /// Single tree over all sections, in emission order.
    pub fn to_tree(&self) -> Node {
        Node::new("xs:schema")
            .attr("xmlns:xs", "http://www.w3.org/2001/XMLSchema")
            .attr("xmlns:rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
            .attr("xmlns:rdfs", "http://www.w3.org/2000/01/rdf-schema#")
            .child(self.header.clone())
            .child(self.root_definition.clone())
            .children(self.definitions.iter().cloned())
            .child(self.substitution_groups.clone())
            .child(self.semantics.clone())
    }

    pub fn render(&self) -> String {
        self.to_tree().render()
    }

    /// Every top-level element name declared by this document.
    pub fn defined_names(&self) -> Vec<String> {
        std::iter::once(&self.root_definition)
            .chain(self.definitions.iter())
            .filter_map(|node| node.attr_value("name").map(str::to_string))
            .collect()
    }

    /// Structural self-check: no duplicate definitions, and every `ref`
    /// used anywhere in the tree resolves to a defined name.
    pub fn validate_structure(&self) -> Result<()> {
        let defined = self.defined_names();
        let mut seen = HashSet::new();
        for name in &defined {
            if !seen.insert(name.clone()) {
                return Err(CompileError::Publish {
                    label: name.clone(),
                    message: "defined more than once in the assembled document".to_string(),
                });
            }
        }

        let mut refs = Vec::new();
        collect_refs(&self.root_definition, &mut refs);
        for definition in &self.definitions {
            collect_refs(definition, &mut refs);
        }
        for reference in refs {
            if !seen.contains(&reference) {
                return Err(CompileError::Publish {
                    label: reference,
                    message: "referenced but never defined".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn collect_refs(node: &Node, out: &mut Vec<String>) {
    if let Some(reference) = node.attr_value("ref") {
        out.push(reference.to_string());
    }
    for child in &node.children {
        collect_refs(child, out);
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler;

impl DocumentAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble(&self, walk: &WalkResult) -> Document {
        let header = Node::new("header")
            .attr("model", &walk.root_label)
            .attr("identity", walk.root_identity.urn())
            .attr("generator", concat!("modelclay/", env!("CARGO_PKG_VERSION")))
            .attr("generated-at", Utc::now().to_rfc3339())
            .attr("definitions", (walk.fragments.len() + 1).to_string());

        let mut definitions = Vec::new();
        for (_, fragment) in &walk.fragments {
            definitions.push(fragment.definition.clone());
            if let Some(adapter) = &fragment.adapter {
                definitions.push(adapter.clone());
            }
        }
        if let Some(adapter) = &walk.root_fragment.adapter {
            definitions.push(adapter.clone());
        }

        let mut substitution_groups = Node::new("substitution-groups");
        for role_set in walk.registry.role_sets() {
            let roles = role_set
                .roles
                .iter()
                .map(|role| role.name())
                .collect::<Vec<_>>()
                .join(" ");
            substitution_groups.push(
                Node::new("identity")
                    .attr("about", role_set.identity.urn())
                    .attr("kind", role_set.kind.name())
                    .attr("roles", roles),
            );
        }

        let mut semantics = Node::new("rdf:RDF");
        for entry in &walk.semantics {
            let mut description = Node::new("rdf:Description")
                .attr("rdf:about", entry.identity.urn())
                .child(Node::new("rdfs:label").text(&entry.label));
            if let Some(text) = &entry.description {
                description.push(Node::new("rdfs:comment").text(text));
            }
            for annotation in &entry.annotations {
                description.push(
                    Node::new("statement")
                        .attr("predicate", &annotation.predicate)
                        .attr("object", annotation.object.as_str()),
                );
            }
            semantics.push(description);
        }

        debug!(
            definitions = definitions.len(),
            identities = walk.registry.len(),
            "document assembled"
        );
        Document {
            header,
            root_definition: walk.root_fragment.definition.clone(),
            definitions,
            substitution_groups,
            semantics,
        }
    }
}
