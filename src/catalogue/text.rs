use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::assembler::{Fragment, Node};
use crate::catalogue::emit::{self, EmitContext};
use crate::catalogue::ComponentMeta;
use crate::error::FieldError;

/// Text value constraint. Length, pattern and enumeration are mutually
/// exclusive; the sum type makes declaring two of them unrepresentable,
/// so swapping kinds is always an explicit whole-constraint replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TextConstraint {
    #[default]
    Free,
    Length {
        min: Option<u32>,
        max: Option<u32>,
        exact: Option<u32>,
    },
    Pattern { pattern: String },
    Enumeration {
        values: Vec<String>,
        default: Option<String>,
    },
}

impl TextConstraint {
    pub fn validate(&self) -> Result<(), FieldError> {
        match self {
            TextConstraint::Free => Ok(()),
            TextConstraint::Length { min, max, exact } => {
                let inverted = matches!((min, max), (Some(lo), Some(hi)) if lo > hi);
                let exact_conflicts = exact.is_some() && (min.is_some() || max.is_some());
                let empty = min.is_none() && max.is_none() && exact.is_none();
                if inverted || exact_conflicts || empty {
                    return Err(FieldError::InvalidLength {
                        min: *min,
                        max: *max,
                        exact: *exact,
                    });
                }
                Ok(())
            }
            TextConstraint::Pattern { pattern } => match Regex::new(pattern) {
                Ok(_) => Ok(()),
                Err(err) => Err(FieldError::MalformedPattern {
                    pattern: pattern.clone(),
                    message: err.to_string(),
                }),
            },
            TextConstraint::Enumeration { values, default } => {
                if values.is_empty() {
                    return Err(FieldError::EmptyEnumeration);
                }
                if let Some(default) = default {
                    if !values.contains(default) {
                        return Err(FieldError::DefaultNotInEnumeration {
                            value: default.clone(),
                        });
                    }
                }
                Ok(())
            }
        }
    }

    fn value_element(&self) -> Node {
        match self {
            TextConstraint::Free => Node::new("xs:element")
                .attr("name", "value")
                .attr("type", "xs:string"),
            TextConstraint::Length { min, max, exact } => {
                let mut facets = Vec::new();
                if let Some(exact) = exact {
                    facets.push(emit::facet("xs:length", exact.to_string()));
                }
                if let Some(min) = min {
                    facets.push(emit::facet("xs:minLength", min.to_string()));
                }
                if let Some(max) = max {
                    facets.push(emit::facet("xs:maxLength", max.to_string()));
                }
                emit::restricted_value("value", "xs:string", facets)
            }
            TextConstraint::Pattern { pattern } => emit::restricted_value(
                "value",
                "xs:string",
                vec![emit::facet("xs:pattern", pattern)],
            ),
            TextConstraint::Enumeration { values, default } => {
                let facets = values
                    .iter()
                    .map(|v| emit::facet("xs:enumeration", v))
                    .collect();
                let mut element = emit::restricted_value("value", "xs:string", facets);
                if let Some(default) = default {
                    element = element.attr("default", default);
                }
                element
            }
        }
    }
}

/// Free, enumerated, pattern- or length-constrained string leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLeaf {
    pub meta: ComponentMeta,
    #[serde(default)]
    pub constraint: TextConstraint,
}

impl TextLeaf {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            constraint: TextConstraint::Free,
        }
    }

    pub fn with_constraint(mut self, constraint: TextConstraint) -> Self {
        self.constraint = constraint;
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        self.constraint.validate()
    }

    pub fn emit_fragment(&self, _ctx: &EmitContext<'_>) -> Fragment {
        emit::leaf_fragment(&self.meta, vec![self.constraint.value_element()])
    }
}

/// Constrained string naming a measurement unit, reused by count,
/// quantity and ratio leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitsDef {
    pub meta: ComponentMeta,
    pub unit: String,
    /// Measured property the unit applies to, e.g. "mass" or "pressure".
    pub property: Option<String>,
    /// Terminology the unit name is drawn from, e.g. the UCUM namespace.
    pub terminology: Option<Url>,
}

impl UnitsDef {
    pub fn new(label: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            unit: unit.into(),
            property: None,
            terminology: None,
        }
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        if self.unit.trim().is_empty() {
            return Err(FieldError::EmptyUnitName);
        }
        Ok(())
    }

    pub fn emit_fragment(&self, _ctx: &EmitContext<'_>) -> Fragment {
        let mut body = vec![
            Node::new("xs:element")
                .attr("name", "unit")
                .attr("type", "xs:string")
                .attr("fixed", &self.unit),
        ];
        if let Some(property) = &self.property {
            body.push(
                Node::new("xs:element")
                    .attr("name", "property")
                    .attr("type", "xs:string")
                    .attr("fixed", property)
                    .attr("minOccurs", "0"),
            );
        }
        if let Some(terminology) = &self.terminology {
            body.push(
                Node::new("xs:element")
                    .attr("name", "terminology")
                    .attr("type", "xs:anyURI")
                    .attr("fixed", terminology.as_str())
                    .attr("minOccurs", "0"),
            );
        }
        emit::leaf_fragment(&self.meta, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_always_validates() {
        assert!(TextLeaf::new("Comment").validate().is_ok());
    }

    #[test]
    fn malformed_pattern_is_a_field_error() {
        let leaf = TextLeaf::new("Code").with_constraint(TextConstraint::Pattern {
            pattern: "[unclosed".to_string(),
        });
        assert!(matches!(
            leaf.validate(),
            Err(FieldError::MalformedPattern { .. })
        ));
    }

    #[test]
    fn exact_length_conflicts_with_bounds() {
        let constraint = TextConstraint::Length {
            min: Some(1),
            max: None,
            exact: Some(4),
        };
        assert!(matches!(
            constraint.validate(),
            Err(FieldError::InvalidLength { .. })
        ));
    }

    #[test]
    fn enumeration_default_must_be_listed() {
        let constraint = TextConstraint::Enumeration {
            values: vec!["red".into(), "green".into()],
            default: Some("blue".into()),
        };
        assert!(matches!(
            constraint.validate(),
            Err(FieldError::DefaultNotInEnumeration { .. })
        ));
    }

    #[test]
    fn empty_unit_name_rejected() {
        let units = UnitsDef::new("Milligrams", "  ");
        assert!(matches!(units.validate(), Err(FieldError::EmptyUnitName)));
    }
}
