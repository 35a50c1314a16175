use serde::{Deserialize, Serialize};

use crate::assembler::{Fragment, Node};
use crate::catalogue::emit::{self, EmitContext};
use crate::catalogue::{ComponentMeta, Identity};
use crate::error::FieldError;

/// Grouping variant: one ordered list of member references, which may be
/// leaf variants or other clusters. A cluster must never reach itself
/// through its members at any depth; the walker rejects that as a
/// structural error rather than silently dropping the edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterDef {
    pub meta: ComponentMeta,
    pub members: Vec<Identity>,
}

impl ClusterDef {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: Identity) -> Self {
        self.members.push(member);
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        if self.members.is_empty() {
            return Err(FieldError::EmptyCluster {
                label: self.meta.label.clone(),
            });
        }
        Ok(())
    }

    /// Members are referenced through their adapters so each occurrence
    /// honors the member's own occurrence override.
    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let body = self
            .members
            .iter()
            .map(|member| {
                Node::new("xs:element").attr("ref", ctx.adapter_name(member))
            })
            .collect();
        emit::leaf_fragment(&self.meta, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cluster_rejected() {
        let cluster = ClusterDef::new("Vitals");
        assert!(matches!(
            cluster.validate(),
            Err(FieldError::EmptyCluster { .. })
        ));
    }

    #[test]
    fn member_order_is_preserved() {
        let first = Identity::mint();
        let second = Identity::mint();
        let cluster = ClusterDef::new("Vitals").with_member(first).with_member(second);
        assert_eq!(cluster.members, vec![first, second]);
    }
}
