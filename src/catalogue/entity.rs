//! Composite entities aggregating clusters, parties and bookkeeping
//! records into one publishable root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::assembler::{Fragment, Node};
use crate::catalogue::emit::{self, EmitContext};
use crate::catalogue::{ComponentMeta, Identity};
use crate::error::FieldError;

fn named_reference(ctx: &EmitContext<'_>, name: &str, identity: &Identity) -> Node {
    Node::new("xs:element")
        .attr("name", name)
        .attr("ref", ctx.element_name(identity))
}

fn external_link(url: &Url) -> Node {
    Node::new("xs:element")
        .attr("name", "external-link")
        .attr("type", "xs:anyURI")
        .attr("fixed", url.as_str())
        .attr("minOccurs", "0")
}

/// A person or organization taking part in the record: optional nested
/// details cluster plus external link references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyDef {
    pub meta: ComponentMeta,
    pub name: Option<String>,
    pub details: Option<Identity>,
    #[serde(default)]
    pub external_links: Vec<Url>,
}

impl PartyDef {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            name: None,
            details: None,
            external_links: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Identity) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_external_link(mut self, link: Url) -> Self {
        self.external_links.push(link);
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()
    }

    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let mut body = Vec::new();
        if let Some(name) = &self.name {
            body.push(
                Node::new("xs:element")
                    .attr("name", "name")
                    .attr("type", "xs:string")
                    .attr("fixed", name),
            );
        }
        if let Some(details) = &self.details {
            body.push(named_reference(ctx, "details", details));
        }
        body.extend(self.external_links.iter().map(external_link));
        Fragment::new(emit::definition(&self.meta, body))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Creation,
    Amendment,
    Deletion,
}

impl ChangeType {
    pub fn name(&self) -> &'static str {
        match self {
            ChangeType::Creation => "creation",
            ChangeType::Amendment => "amendment",
            ChangeType::Deletion => "deletion",
        }
    }
}

/// Audit trail record: which system committed what kind of change, when,
/// and on whose behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditDef {
    pub meta: ComponentMeta,
    pub system_id: String,
    pub change_type: ChangeType,
    pub committer: Option<Identity>,
    pub time_committed: Option<DateTime<Utc>>,
}

impl AuditDef {
    pub fn new(label: impl Into<String>, system_id: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            system_id: system_id.into(),
            change_type: ChangeType::Creation,
            committer: None,
            time_committed: None,
        }
    }

    pub fn with_committer(mut self, committer: Identity) -> Self {
        self.committer = Some(committer);
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        if self.system_id.trim().is_empty() {
            return Err(FieldError::EmptyAuditSystemId);
        }
        Ok(())
    }

    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let mut body = vec![
            Node::new("xs:element")
                .attr("name", "system-id")
                .attr("type", "xs:string")
                .attr("fixed", &self.system_id),
            Node::new("xs:element")
                .attr("name", "change-type")
                .attr("type", "xs:string")
                .attr("fixed", self.change_type.name()),
            Node::new("xs:element")
                .attr("name", "time-committed")
                .attr("type", "xs:dateTime"),
        ];
        if let Some(committer) = &self.committer {
            body.push(named_reference(ctx, "committer", committer));
        }
        Fragment::new(emit::definition(&self.meta, body))
    }
}

/// Signed-off confirmation of (part of) the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationDef {
    pub meta: ComponentMeta,
    pub reason: String,
    pub proof: Option<Url>,
    pub attester: Option<Identity>,
}

impl AttestationDef {
    pub fn new(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            reason: reason.into(),
            proof: None,
            attester: None,
        }
    }

    pub fn with_attester(mut self, attester: Identity) -> Self {
        self.attester = Some(attester);
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        if self.reason.trim().is_empty() {
            return Err(FieldError::EmptyAttestationReason);
        }
        Ok(())
    }

    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let mut body = vec![
            Node::new("xs:element")
                .attr("name", "reason")
                .attr("type", "xs:string")
                .attr("fixed", &self.reason),
        ];
        if let Some(proof) = &self.proof {
            body.push(
                Node::new("xs:element")
                    .attr("name", "proof")
                    .attr("type", "xs:anyURI")
                    .attr("fixed", proof.as_str())
                    .attr("minOccurs", "0"),
            );
        }
        if let Some(attester) = &self.attester {
            body.push(named_reference(ctx, "attester", attester));
        }
        Fragment::new(emit::definition(&self.meta, body))
    }
}

/// A party's involvement in the recorded activity, e.g. "witness" or
/// "assistant".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipationDef {
    pub meta: ComponentMeta,
    pub function: String,
    pub mode: Option<String>,
    pub performer: Option<Identity>,
}

impl ParticipationDef {
    pub fn new(label: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            function: function.into(),
            mode: None,
            performer: None,
        }
    }

    pub fn with_performer(mut self, performer: Identity) -> Self {
        self.performer = Some(performer);
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        if self.function.trim().is_empty() {
            return Err(FieldError::EmptyParticipationFunction);
        }
        if self.performer.is_none() {
            return Err(FieldError::MissingRequiredReference {
                label: self.meta.label.clone(),
                slot: "performer".to_string(),
            });
        }
        Ok(())
    }

    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let mut body = vec![
            Node::new("xs:element")
                .attr("name", "function")
                .attr("type", "xs:string")
                .attr("fixed", &self.function),
        ];
        if let Some(mode) = &self.mode {
            body.push(
                Node::new("xs:element")
                    .attr("name", "mode")
                    .attr("type", "xs:string")
                    .attr("fixed", mode)
                    .attr("minOccurs", "0"),
            );
        }
        if let Some(performer) = &self.performer {
            body.push(named_reference(ctx, "performer", performer));
        }
        Fragment::new(emit::definition(&self.meta, body))
    }
}

/// One clinical statement: a payload cluster plus the parties and
/// bookkeeping records around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryDef {
    pub meta: ComponentMeta,
    pub payload: Option<Identity>,
    pub subject: Option<Identity>,
    pub provider: Option<Identity>,
    #[serde(default)]
    pub participations: Vec<Identity>,
    pub protocol: Option<Identity>,
    pub workflow: Option<Url>,
    pub audit: Option<Identity>,
    pub attestation: Option<Identity>,
    #[serde(default)]
    pub links: Vec<Url>,
}

impl EntryDef {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            payload: None,
            subject: None,
            provider: None,
            participations: Vec::new(),
            protocol: None,
            workflow: None,
            audit: None,
            attestation: None,
            links: Vec::new(),
        }
    }

    pub fn with_payload(mut self, payload: Identity) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_subject(mut self, subject: Identity) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_provider(mut self, provider: Identity) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_participation(mut self, participation: Identity) -> Self {
        self.participations.push(participation);
        self
    }

    pub fn with_protocol(mut self, protocol: Identity) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn with_workflow(mut self, workflow: Url) -> Self {
        self.workflow = Some(workflow);
        self
    }

    pub fn with_audit(mut self, audit: Identity) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_attestation(mut self, attestation: Identity) -> Self {
        self.attestation = Some(attestation);
        self
    }

    pub fn with_link(mut self, link: Url) -> Self {
        self.links.push(link);
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        for (slot, reference) in [
            ("payload", &self.payload),
            ("subject", &self.subject),
            ("provider", &self.provider),
        ] {
            if reference.is_none() {
                return Err(FieldError::MissingRequiredReference {
                    label: self.meta.label.clone(),
                    slot: slot.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let mut body = Vec::new();
        if let Some(payload) = &self.payload {
            body.push(named_reference(ctx, "payload", payload));
        }
        if let Some(subject) = &self.subject {
            body.push(named_reference(ctx, "subject", subject));
        }
        if let Some(provider) = &self.provider {
            body.push(named_reference(ctx, "provider", provider));
        }
        for participation in &self.participations {
            body.push(named_reference(ctx, "participation", participation));
        }
        if let Some(protocol) = &self.protocol {
            body.push(named_reference(ctx, "protocol", protocol));
        }
        if let Some(workflow) = &self.workflow {
            body.push(
                Node::new("xs:element")
                    .attr("name", "workflow")
                    .attr("type", "xs:anyURI")
                    .attr("fixed", workflow.as_str())
                    .attr("minOccurs", "0"),
            );
        }
        if let Some(audit) = &self.audit {
            body.push(named_reference(ctx, "audit", audit));
        }
        if let Some(attestation) = &self.attestation {
            body.push(named_reference(ctx, "attestation", attestation));
        }
        body.extend(self.links.iter().map(external_link));
        Fragment::new(emit::definition(&self.meta, body))
    }
}

/// Root of one published model: exactly one entry plus model metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataModelDef {
    pub meta: ComponentMeta,
    pub version: String,
    pub purpose: Option<String>,
    pub entry: Option<Identity>,
}

impl DataModelDef {
    pub fn new(label: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            version: version.into(),
            purpose: None,
            entry: None,
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn with_entry(mut self, entry: Identity) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        if self.entry.is_none() {
            return Err(FieldError::MissingRequiredReference {
                label: self.meta.label.clone(),
                slot: "entry".to_string(),
            });
        }
        Ok(())
    }

    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let mut body = vec![
            Node::new("xs:element")
                .attr("name", "version")
                .attr("type", "xs:string")
                .attr("fixed", &self.version),
        ];
        if let Some(purpose) = &self.purpose {
            body.push(
                Node::new("xs:element")
                    .attr("name", "purpose")
                    .attr("type", "xs:string")
                    .attr("fixed", purpose)
                    .attr("minOccurs", "0"),
            );
        }
        if let Some(entry) = &self.entry {
            body.push(named_reference(ctx, "entry", entry));
        }
        Fragment::new(emit::definition(&self.meta, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_requires_its_core_slots() {
        let entry = EntryDef::new("Observation").with_payload(Identity::mint());
        assert!(matches!(
            entry.validate(),
            Err(FieldError::MissingRequiredReference { slot, .. }) if slot == "subject"
        ));
    }

    #[test]
    fn participation_requires_performer() {
        let participation = ParticipationDef::new("Witnessing", "witness");
        assert!(matches!(
            participation.validate(),
            Err(FieldError::MissingRequiredReference { slot, .. }) if slot == "performer"
        ));
    }

    #[test]
    fn data_model_requires_entry() {
        let model = DataModelDef::new("Vitals model", "1.0.0");
        assert!(matches!(
            model.validate(),
            Err(FieldError::MissingRequiredReference { slot, .. }) if slot == "entry"
        ));
    }
}
