use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assembler::{Fragment, Node};
use crate::catalogue::emit::{self, EmitContext};
use crate::catalogue::{ComponentMeta, Identity};
use crate::error::FieldError;

/// Comparable base kind an interval is typed over. Endpoint values carry
/// this kind's representation and are checked against it on validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntervalKind {
    Integer,
    Decimal,
    Date,
    Time,
    DateTime,
    Duration,
}

impl IntervalKind {
    pub fn xs_type(&self) -> &'static str {
        match self {
            IntervalKind::Integer => "xs:integer",
            IntervalKind::Decimal => "xs:decimal",
            IntervalKind::Date => "xs:date",
            IntervalKind::Time => "xs:time",
            IntervalKind::DateTime => "xs:dateTime",
            IntervalKind::Duration => "xs:duration",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IntervalKind::Integer => "integer",
            IntervalKind::Decimal => "decimal",
            IntervalKind::Date => "date",
            IntervalKind::Time => "time",
            IntervalKind::DateTime => "date-time",
            IntervalKind::Duration => "duration",
        }
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            IntervalKind::Integer => {
                if value.as_i64().is_some() {
                    Ok(())
                } else {
                    Err(format!("'{value}' is not an integer"))
                }
            }
            IntervalKind::Decimal => {
                if value.as_f64().is_some() {
                    Ok(())
                } else {
                    Err(format!("'{value}' is not a decimal"))
                }
            }
            IntervalKind::Date => parse_str(value, |s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|_| ())
            }),
            IntervalKind::Time => parse_str(value, |s| {
                NaiveTime::parse_from_str(s, "%H:%M:%S").map(|_| ())
            }),
            IntervalKind::DateTime => {
                parse_str(value, |s| DateTime::parse_from_rfc3339(s).map(|_| ()))
            }
            IntervalKind::Duration => match value.as_str() {
                Some(s) if s.starts_with('P') && s.len() > 1 => Ok(()),
                _ => Err(format!("'{value}' is not an ISO 8601 duration")),
            },
        }
    }
}

fn parse_str<E: std::fmt::Display>(
    value: &Value,
    parse: impl Fn(&str) -> Result<(), E>,
) -> Result<(), String> {
    match value.as_str() {
        Some(s) => parse(s).map_err(|e| format!("'{s}': {e}")),
        None => Err(format!("'{value}' is not a string")),
    }
}

/// One interval endpoint: `value: None` marks the side as unbounded, and
/// `inclusive` only matters on bounded sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalBound {
    pub value: Option<Value>,
    #[serde(default = "default_inclusive")]
    pub inclusive: bool,
}

fn default_inclusive() -> bool {
    true
}

impl IntervalBound {
    pub fn unbounded() -> Self {
        Self {
            value: None,
            inclusive: false,
        }
    }

    pub fn inclusive(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            inclusive: true,
        }
    }

    pub fn exclusive(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            inclusive: false,
        }
    }

    fn emit(&self, name: &str, kind: IntervalKind) -> Node {
        let mut node = Node::new("xs:element")
            .attr("name", name)
            .attr("type", kind.xs_type());
        match &self.value {
            Some(value) => {
                node = node
                    .attr("bounded", "true")
                    .attr("inclusive", self.inclusive.to_string())
                    .attr("value", render_value(value));
            }
            None => node = node.attr("bounded", "false"),
        }
        node
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Interval component typed over one comparable base kind, with
/// inclusive/exclusive and bounded/unbounded flags on each endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalDef {
    pub meta: ComponentMeta,
    pub kind: IntervalKind,
    pub lower: IntervalBound,
    pub upper: IntervalBound,
}

impl IntervalDef {
    pub fn new(label: impl Into<String>, kind: IntervalKind) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            kind,
            lower: IntervalBound::unbounded(),
            upper: IntervalBound::unbounded(),
        }
    }

    pub fn with_lower(mut self, lower: IntervalBound) -> Self {
        self.lower = lower;
        self
    }

    pub fn with_upper(mut self, upper: IntervalBound) -> Self {
        self.upper = upper;
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        for bound in [&self.lower, &self.upper] {
            if let Some(value) = &bound.value {
                self.kind.check(value).map_err(|message| {
                    FieldError::IntervalEndpointMismatch {
                        kind: self.kind.name().to_string(),
                        message,
                    }
                })?;
            }
        }
        if matches!(self.kind, IntervalKind::Integer | IntervalKind::Decimal) {
            if let (Some(lower), Some(upper)) = (
                self.lower.value.as_ref().and_then(Value::as_f64),
                self.upper.value.as_ref().and_then(Value::as_f64),
            ) {
                if lower > upper {
                    return Err(FieldError::InvertedInterval);
                }
            }
        }
        Ok(())
    }

    pub fn emit_fragment(&self, _ctx: &EmitContext<'_>) -> Fragment {
        let body = vec![
            self.lower.emit("lower", self.kind),
            self.upper.emit("upper", self.kind),
        ];
        Fragment::new(emit::definition(&self.meta, body))
    }
}

/// Named sub-range of an ordered leaf's value space, owning exactly one
/// interval component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub meta: ComponentMeta,
    /// What the range means clinically, e.g. "normal" or "critical".
    pub meaning: String,
    pub interval: Option<Identity>,
}

impl ReferenceRange {
    pub fn new(label: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            meaning: meaning.into(),
            interval: None,
        }
    }

    pub fn with_interval(mut self, interval: Identity) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        if self.interval.is_none() {
            return Err(FieldError::MissingInterval);
        }
        Ok(())
    }

    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let mut body = vec![
            Node::new("xs:element")
                .attr("name", "meaning")
                .attr("type", "xs:string")
                .attr("fixed", &self.meaning),
        ];
        if let Some(interval) = &self.interval {
            body.push(emit::reference(ctx, interval));
        }
        Fragment::new(emit::definition(&self.meta, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_must_agree_with_kind() {
        let interval = IntervalDef::new("Range", IntervalKind::Date)
            .with_lower(IntervalBound::inclusive(10));
        assert!(matches!(
            interval.validate(),
            Err(FieldError::IntervalEndpointMismatch { .. })
        ));
    }

    #[test]
    fn inverted_numeric_interval_rejected() {
        let interval = IntervalDef::new("Range", IntervalKind::Integer)
            .with_lower(IntervalBound::inclusive(20))
            .with_upper(IntervalBound::inclusive(10));
        assert!(matches!(interval.validate(), Err(FieldError::InvertedInterval)));
    }

    #[test]
    fn unbounded_sides_always_agree() {
        let interval = IntervalDef::new("Range", IntervalKind::Duration)
            .with_upper(IntervalBound::exclusive("P30D"));
        assert!(interval.validate().is_ok());
    }

    #[test]
    fn reference_range_requires_interval() {
        let range = ReferenceRange::new("Normal", "normal");
        assert!(matches!(range.validate(), Err(FieldError::MissingInterval)));
    }
}
