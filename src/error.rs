use thiserror::Error;

use crate::catalogue::{ComponentKind, Identity, SlotReference};

/// Local constraint violation inside a single component.
///
/// Field errors are reported to the author and never recovered from
/// automatically; the component stays in Draft.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("malformed pattern '{pattern}': {message}")]
    MalformedPattern { pattern: String, message: String },

    #[error("enumeration constraint declares no values")]
    EmptyEnumeration,

    #[error("enumeration default '{value}' is not one of the listed values")]
    DefaultNotInEnumeration { value: String },

    #[error("length constraint is empty or inverted (min {min:?}, max {max:?}, exact {exact:?})")]
    InvalidLength {
        min: Option<u32>,
        max: Option<u32>,
        exact: Option<u32>,
    },

    #[error("ratio reuses units component {identity} for more than one of its unit slots")]
    DuplicateRatioUnit { identity: Identity },

    #[error("required units reference is missing on '{label}'")]
    MissingUnitReference { label: String },

    #[error("units component declares an empty unit name")]
    EmptyUnitName,

    #[error("temporal declares more than one duration kind")]
    ConflictingDurationKinds,

    #[error("temporal mixes duration kinds with date/time kinds")]
    DurationExclusivity,

    #[error("temporal allows no value kind at all")]
    EmptyTemporal,

    #[error("ordinal list has {ordinals} entries but symbol list has {symbols}")]
    OrdinalSymbolMismatch { ordinals: usize, symbols: usize },

    #[error("interval endpoint does not agree with base kind {kind}: {message}")]
    IntervalEndpointMismatch { kind: String, message: String },

    #[error("interval lower bound is above its upper bound")]
    InvertedInterval,

    #[error("reference range declares no interval")]
    MissingInterval,

    #[error("numeric bound has min above max")]
    InvertedNumericBound,

    #[error("cardinality override has min {min} greater than max {max}")]
    InvertedCardinality { min: u32, max: u32 },

    #[error("link relation must not be empty")]
    EmptyLinkRelation,

    #[error("cluster '{label}' declares no nested components")]
    EmptyCluster { label: String },

    #[error("'{label}' is missing its required {slot} reference")]
    MissingRequiredReference { label: String, slot: String },

    #[error("audit system id must not be empty")]
    EmptyAuditSystemId,

    #[error("attestation reason must not be empty")]
    EmptyAttestationReason,

    #[error("participation function must not be empty")]
    EmptyParticipationFunction,

    #[error("component '{label}' is published and immutable")]
    Immutable { label: String },
}

/// Everything that can abort a compilation or a publish attempt.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("field error on '{label}': {source}")]
    Field {
        label: String,
        #[source]
        source: FieldError,
    },

    #[error("dependency {identity} referenced by '{label}' is not in the store")]
    MissingDependency { label: String, identity: Identity },

    #[error("dependency {identity} referenced by '{label}' is not published")]
    UnpublishedDependency { label: String, identity: Identity },

    #[error("cluster '{label}' ({identity}) contains itself")]
    SelfReferentialCluster { label: String, identity: Identity },

    #[error("cluster '{label}' member {identity} is a {kind}, which cannot nest in a cluster")]
    InvalidClusterMember {
        label: String,
        identity: Identity,
        kind: String,
    },

    #[error("'{label}' {slot} slot expects a {expected}, but {identity} is a {found}")]
    SlotKindMismatch {
        label: String,
        slot: String,
        identity: Identity,
        expected: String,
        found: String,
    },

    #[error(
        "suspected cycle or pathological nesting: {visits} cluster visits exceed the ceiling of {ceiling}"
    )]
    NestingCeiling { visits: usize, ceiling: usize },

    #[error("component '{label}' cannot be published: {message}")]
    Publish { label: String, message: String },

    #[error("identity {identity} was retired by a reset and cannot be reused")]
    RetiredIdentity { identity: Identity },

    #[error("no draft component under handle {handle}")]
    UnknownDraft { handle: uuid::Uuid },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl CompileError {
    pub fn field(label: impl Into<String>, source: FieldError) -> Self {
        Self::Field {
            label: label.into(),
            source,
        }
    }

    pub fn slot_mismatch(label: impl Into<String>, slot: &SlotReference, found: ComponentKind) -> Self {
        Self::SlotKindMismatch {
            label: label.into(),
            slot: slot.slot.to_string(),
            identity: slot.identity,
            expected: slot.expected.describe().to_string(),
            found: found.name().to_string(),
        }
    }

    /// True for the dependency-flavored variants, used by callers that
    /// retry after publishing missing pieces.
    pub fn is_dependency(&self) -> bool {
        matches!(
            self,
            Self::MissingDependency { .. } | Self::UnpublishedDependency { .. }
        )
    }
}

/// Non-fatal note recorded when instance synthesis cannot satisfy a
/// constraint; a placeholder value is emitted instead of aborting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationWarning {
    pub identity: Identity,
    pub label: String,
    pub message: String,
}

impl GenerationWarning {
    pub fn new(identity: Identity, label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identity,
            label: label.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
