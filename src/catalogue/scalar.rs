use serde::{Deserialize, Serialize};
use url::Url;

use crate::assembler::{Fragment, Node};
use crate::catalogue::emit::{self, EmitContext};
use crate::catalogue::ComponentMeta;
use crate::error::FieldError;

/// Boolean-choice leaf. Optionally pinned to a single allowed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanLeaf {
    pub meta: ComponentMeta,
    /// When set, the instance value is fixed to this choice.
    pub fixed: Option<bool>,
}

impl BooleanLeaf {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            fixed: None,
        }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()
    }

    pub fn emit_fragment(&self, _ctx: &EmitContext<'_>) -> Fragment {
        let mut value = Node::new("xs:element")
            .attr("name", "value")
            .attr("type", "xs:boolean");
        if let Some(fixed) = self.fixed {
            value = value.attr("fixed", fixed.to_string());
        }
        emit::leaf_fragment(&self.meta, vec![value])
    }
}

/// Link leaf: a URI target plus a typed relation naming how the target
/// relates to the owning record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkLeaf {
    pub meta: ComponentMeta,
    pub relation: String,
    /// Fixed target, when the model pins the link to one URI.
    pub target: Option<Url>,
}

impl LinkLeaf {
    pub fn new(label: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            relation: relation.into(),
            target: None,
        }
    }

    pub fn with_target(mut self, target: Url) -> Self {
        self.target = Some(target);
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        if self.relation.trim().is_empty() {
            return Err(FieldError::EmptyLinkRelation);
        }
        Ok(())
    }

    pub fn emit_fragment(&self, _ctx: &EmitContext<'_>) -> Fragment {
        let mut target = Node::new("xs:element")
            .attr("name", "target")
            .attr("type", "xs:anyURI");
        if let Some(fixed) = &self.target {
            target = target.attr("fixed", fixed.as_str());
        }
        let relation = Node::new("xs:element")
            .attr("name", "relation")
            .attr("type", "xs:string")
            .attr("fixed", &self.relation);
        emit::leaf_fragment(&self.meta, vec![relation, target])
    }
}

/// File/blob leaf: base64 payload plus an optional closed list of
/// acceptable media types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobLeaf {
    pub meta: ComponentMeta,
    #[serde(default)]
    pub media_types: Vec<String>,
    /// Upper bound on the payload size in bytes, when the model declares one.
    pub max_size: Option<u64>,
}

impl BlobLeaf {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            media_types: Vec::new(),
            max_size: None,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_types.push(media_type.into());
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()
    }

    pub fn emit_fragment(&self, _ctx: &EmitContext<'_>) -> Fragment {
        let mut body = Vec::new();
        if self.media_types.is_empty() {
            body.push(
                Node::new("xs:element")
                    .attr("name", "media-type")
                    .attr("type", "xs:string")
                    .attr("minOccurs", "0"),
            );
        } else {
            let facets = self
                .media_types
                .iter()
                .map(|m| emit::facet("xs:enumeration", m))
                .collect();
            body.push(emit::restricted_value("media-type", "xs:string", facets));
        }
        let mut data = Node::new("xs:element")
            .attr("name", "data")
            .attr("type", "xs:base64Binary");
        if let Some(max_size) = self.max_size {
            data = data.attr("max-size", max_size.to_string());
        }
        body.push(data);
        emit::leaf_fragment(&self.meta, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_relation_rejected() {
        let link = LinkLeaf::new("Guideline", "");
        assert!(matches!(link.validate(), Err(FieldError::EmptyLinkRelation)));
    }

    #[test]
    fn blob_media_types_become_enumeration_facets() {
        let store = crate::store::MemoryComponentStore::new();
        let ctx = EmitContext::new(&store);
        let blob = BlobLeaf::new("Scan")
            .with_media_type("image/png")
            .with_media_type("image/jpeg");
        let fragment = blob.emit_fragment(&ctx);
        let restriction = fragment.definition.find_deep("xs:restriction").unwrap();
        assert_eq!(restriction.children.len(), 2);
    }
}
