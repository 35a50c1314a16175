use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::assembler::Fragment;
use crate::error::FieldError;

/// Globally unique token naming a published component. Immutable once
/// assigned; a reset retires the old value and the next publish mints a
/// fresh one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Identity(Uuid);

impl Identity {
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First hex group of the UUID, used to keep element names readable.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }

    pub fn urn(&self) -> String {
        format!("urn:uuid:{}", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Occurrence bounds for one structural slot. `max: None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub min: u32,
    pub max: Option<u32>,
}

impl Occurrence {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn required() -> Self {
        Self { min: 1, max: Some(1) }
    }

    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    pub fn unbounded() -> Self {
        Self { min: 0, max: None }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if let Some(max) = self.max {
            if self.min > max {
                return Err(FieldError::InvertedCardinality { min: self.min, max });
            }
        }
        Ok(())
    }

    /// Attribute value in schema notation, e.g. "unbounded" for no max.
    pub fn max_attr(&self) -> String {
        match self.max {
            Some(max) => max.to_string(),
            None => "unbounded".to_string(),
        }
    }
}

impl Default for Occurrence {
    fn default() -> Self {
        Self::required()
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

/// Optional structural slots shared by every variant's restriction, in the
/// fixed order they appear in an emitted definition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Slot {
    /// How many times the component may occur inside its adapter.
    Occurrences,
    ExceptionalValue,
    ValidTimeBegin,
    ValidTimeEnd,
    Recorded,
    Modified,
    Location,
    ReferenceRanges,
}

impl Slot {
    pub fn element_name(&self) -> &'static str {
        match self {
            Slot::Occurrences => "occurrences",
            Slot::ExceptionalValue => "exceptional-value",
            Slot::ValidTimeBegin => "valid-time-begin",
            Slot::ValidTimeEnd => "valid-time-end",
            Slot::Recorded => "recorded",
            Slot::Modified => "modified",
            Slot::Location => "location",
            Slot::ReferenceRanges => "reference-range",
        }
    }

    /// The common slots every leaf restriction advertises, in emission order.
    pub const COMMON: [Slot; 6] = [
        Slot::ExceptionalValue,
        Slot::ValidTimeBegin,
        Slot::ValidTimeEnd,
        Slot::Recorded,
        Slot::Modified,
        Slot::Location,
    ];
}

/// One (predicate, object) pair emitted as an RDF statement about the
/// owning component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub predicate: String,
    pub object: Url,
}

impl Annotation {
    pub fn new(predicate: impl Into<String>, object: Url) -> Self {
        Self {
            predicate: predicate.into(),
            object,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Draft,
    Published,
}

/// The capability shared by every catalogue variant: label, description,
/// per-slot cardinality overrides, semantic annotations, and the publish
/// bookkeeping (identity, cached fragment, immutability flag).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMeta {
    pub label: String,
    pub description: Option<String>,
    #[serde(default)]
    pub occurrences: BTreeMap<Slot, Occurrence>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    pub identity: Option<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<Fragment>,
    #[serde(default)]
    pub locked: bool,
}

impl ComponentMeta {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            occurrences: BTreeMap::new(),
            annotations: Vec::new(),
            identity: None,
            fragment: None,
            locked: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_occurrence(mut self, slot: Slot, occurrence: Occurrence) -> Self {
        self.occurrences.insert(slot, occurrence);
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn state(&self) -> LifecycleState {
        if self.locked {
            LifecycleState::Published
        } else {
            LifecycleState::Draft
        }
    }

    pub fn ensure_mutable(&self) -> Result<(), FieldError> {
        if self.locked {
            return Err(FieldError::Immutable {
                label: self.label.clone(),
            });
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        for occurrence in self.occurrences.values() {
            occurrence.validate()?;
        }
        Ok(())
    }

    /// Occurrence override for a slot, falling back to the slot's default:
    /// common slots are optional, the adapter occurrence is unbounded.
    pub fn occurrence(&self, slot: Slot) -> Occurrence {
        if let Some(occurrence) = self.occurrences.get(&slot) {
            return *occurrence;
        }
        match slot {
            Slot::Occurrences | Slot::ReferenceRanges => Occurrence::unbounded(),
            _ => Occurrence::optional(),
        }
    }

    /// Element name used in the emitted document. Stable for the lifetime
    /// of the identity; only meaningful once published.
    pub fn element_name(&self) -> String {
        match &self.identity {
            Some(identity) => format!("{}.{}", sanitize_label(&self.label), identity.short()),
            None => sanitize_label(&self.label),
        }
    }
}

/// Lowercase the label and collapse anything non-alphanumeric into single
/// hyphens so it is usable as a schema element name.
pub fn sanitize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_hyphen = false;
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    if out.is_empty() {
        out.push_str("component");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_punctuation() {
        assert_eq!(sanitize_label("Heart rate (resting)"), "heart-rate-resting");
        assert_eq!(sanitize_label("  "), "component");
        assert_eq!(sanitize_label("SpO2"), "spo2");
    }

    #[test]
    fn occurrence_display_and_bounds() {
        assert_eq!(Occurrence::unbounded().to_string(), "0..*");
        assert_eq!(Occurrence::new(1, Some(3)).to_string(), "1..3");
        assert!(Occurrence::new(2, Some(1)).validate().is_err());
    }

    #[test]
    fn meta_mutability_guard() {
        let mut meta = ComponentMeta::new("Weight");
        assert!(meta.ensure_mutable().is_ok());
        meta.locked = true;
        assert!(matches!(
            meta.ensure_mutable(),
            Err(FieldError::Immutable { .. })
        ));
    }
}
