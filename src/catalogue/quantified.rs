//! Ordered/quantified leaf variants: count, quantity, ratio, ordinal and
//! temporal. These all carry reference ranges; count/quantity/ratio also
//! reference units components.

use serde::{Deserialize, Serialize};

use crate::assembler::{Fragment, Node};
use crate::catalogue::emit::{self, EmitContext};
use crate::catalogue::{ComponentMeta, Identity};
use crate::error::FieldError;

/// Declared bound on a numeric magnitude. Either side may be open, and a
/// total-digit limit may cap the rendered precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericBound {
    pub min: Option<f64>,
    #[serde(default = "default_true")]
    pub min_inclusive: bool,
    pub max: Option<f64>,
    #[serde(default = "default_true")]
    pub max_inclusive: bool,
    pub max_digits: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl Default for NumericBound {
    /// Both sides open and inclusive, matching the serde defaults.
    fn default() -> Self {
        Self {
            min: None,
            min_inclusive: true,
            max: None,
            max_inclusive: true,
            max_digits: None,
        }
    }
}

impl NumericBound {
    pub fn inclusive(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            min_inclusive: true,
            max: Some(max),
            max_inclusive: true,
            max_digits: None,
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    pub fn with_max_digits(mut self, digits: u32) -> Self {
        self.max_digits = Some(digits);
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(FieldError::InvertedNumericBound);
            }
        }
        Ok(())
    }

    pub fn facets(&self) -> Vec<Node> {
        let mut facets = Vec::new();
        if let Some(min) = self.min {
            let name = if self.min_inclusive {
                "xs:minInclusive"
            } else {
                "xs:minExclusive"
            };
            facets.push(emit::facet(name, trim_float(min)));
        }
        if let Some(max) = self.max {
            let name = if self.max_inclusive {
                "xs:maxInclusive"
            } else {
                "xs:maxExclusive"
            };
            facets.push(emit::facet(name, trim_float(max)));
        }
        if let Some(digits) = self.max_digits {
            facets.push(emit::facet("xs:totalDigits", digits.to_string()));
        }
        facets
    }
}

/// Render whole numbers without a trailing ".0" so integer facets stay
/// integers in the document.
pub fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn magnitude_element(name: &str, base: &str, bound: &Option<NumericBound>) -> Node {
    match bound {
        Some(bound) => emit::restricted_value(name, base, bound.facets()),
        None => Node::new("xs:element").attr("name", name).attr("type", base),
    }
}

fn units_ref(ctx: &EmitContext<'_>, name: &str, identity: &Identity) -> Node {
    Node::new("xs:element")
        .attr("name", name)
        .attr("ref", ctx.element_name(identity))
}

/// Count of something: an integral magnitude plus optional units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountLeaf {
    pub meta: ComponentMeta,
    pub magnitude: Option<NumericBound>,
    pub units: Option<Identity>,
    #[serde(default)]
    pub reference_ranges: Vec<Identity>,
}

impl CountLeaf {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            magnitude: None,
            units: None,
            reference_ranges: Vec::new(),
        }
    }

    pub fn with_magnitude(mut self, bound: NumericBound) -> Self {
        self.magnitude = Some(bound);
        self
    }

    pub fn with_units(mut self, units: Identity) -> Self {
        self.units = Some(units);
        self
    }

    pub fn with_reference_range(mut self, range: Identity) -> Self {
        self.reference_ranges.push(range);
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        if let Some(bound) = &self.magnitude {
            bound.validate()?;
        }
        Ok(())
    }

    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let mut body = vec![magnitude_element("magnitude", "xs:integer", &self.magnitude)];
        if let Some(units) = &self.units {
            body.push(units_ref(ctx, "units", units));
        }
        body.extend(emit::reference_range_refs(ctx, &self.meta, &self.reference_ranges));
        emit::leaf_fragment(&self.meta, body)
    }
}

/// Measured quantity: decimal magnitude plus a required units reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityLeaf {
    pub meta: ComponentMeta,
    pub magnitude: Option<NumericBound>,
    pub units: Option<Identity>,
    #[serde(default)]
    pub reference_ranges: Vec<Identity>,
}

impl QuantityLeaf {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            magnitude: None,
            units: None,
            reference_ranges: Vec::new(),
        }
    }

    pub fn with_magnitude(mut self, bound: NumericBound) -> Self {
        self.magnitude = Some(bound);
        self
    }

    pub fn with_units(mut self, units: Identity) -> Self {
        self.units = Some(units);
        self
    }

    pub fn with_reference_range(mut self, range: Identity) -> Self {
        self.reference_ranges.push(range);
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        if let Some(bound) = &self.magnitude {
            bound.validate()?;
        }
        if self.units.is_none() {
            return Err(FieldError::MissingUnitReference {
                label: self.meta.label.clone(),
            });
        }
        Ok(())
    }

    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let mut body = vec![magnitude_element("magnitude", "xs:decimal", &self.magnitude)];
        if let Some(units) = &self.units {
            body.push(units_ref(ctx, "units", units));
        }
        body.extend(emit::reference_range_refs(ctx, &self.meta, &self.reference_ranges));
        emit::leaf_fragment(&self.meta, body)
    }
}

/// Ratio of two measured quantities. The numerator, denominator and
/// overall-ratio unit slots must name three distinct units components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioLeaf {
    pub meta: ComponentMeta,
    pub numerator: Option<NumericBound>,
    pub denominator: Option<NumericBound>,
    pub numerator_units: Option<Identity>,
    pub denominator_units: Option<Identity>,
    pub ratio_units: Option<Identity>,
    #[serde(default)]
    pub reference_ranges: Vec<Identity>,
}

impl RatioLeaf {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            numerator: None,
            denominator: None,
            numerator_units: None,
            denominator_units: None,
            ratio_units: None,
            reference_ranges: Vec::new(),
        }
    }

    pub fn with_units(
        mut self,
        numerator: Identity,
        denominator: Identity,
        ratio: Option<Identity>,
    ) -> Self {
        self.numerator_units = Some(numerator);
        self.denominator_units = Some(denominator);
        self.ratio_units = ratio;
        self
    }

    pub fn with_reference_range(mut self, range: Identity) -> Self {
        self.reference_ranges.push(range);
        self
    }

    pub fn unit_slots(&self) -> Vec<Identity> {
        [self.numerator_units, self.denominator_units, self.ratio_units]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        for bound in [&self.numerator, &self.denominator].into_iter().flatten() {
            bound.validate()?;
        }
        if self.numerator_units.is_none() || self.denominator_units.is_none() {
            return Err(FieldError::MissingUnitReference {
                label: self.meta.label.clone(),
            });
        }
        let slots = self.unit_slots();
        for (i, a) in slots.iter().enumerate() {
            if slots.iter().skip(i + 1).any(|b| b == a) {
                return Err(FieldError::DuplicateRatioUnit { identity: *a });
            }
        }
        Ok(())
    }

    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let mut body = Vec::new();
        let mut numerator = Node::new("xs:element").attr("name", "numerator").child(
            Node::new("xs:complexType").child(
                Node::new("xs:sequence")
                    .child(magnitude_element("magnitude", "xs:decimal", &self.numerator)),
            ),
        );
        if let Some(units) = &self.numerator_units {
            if let Some(sequence) = first_sequence(&mut numerator) {
                sequence.push(units_ref(ctx, "units", units));
            }
        }
        body.push(numerator);

        let mut denominator = Node::new("xs:element").attr("name", "denominator").child(
            Node::new("xs:complexType").child(
                Node::new("xs:sequence")
                    .child(magnitude_element("magnitude", "xs:decimal", &self.denominator)),
            ),
        );
        if let Some(units) = &self.denominator_units {
            if let Some(sequence) = first_sequence(&mut denominator) {
                sequence.push(units_ref(ctx, "units", units));
            }
        }
        body.push(denominator);

        if let Some(units) = &self.ratio_units {
            body.push(units_ref(ctx, "ratio-units", units));
        }
        body.extend(emit::reference_range_refs(ctx, &self.meta, &self.reference_ranges));
        emit::leaf_fragment(&self.meta, body)
    }
}

fn first_sequence(element: &mut Node) -> Option<&mut Node> {
    element
        .children
        .iter_mut()
        .find(|c| c.name == "xs:complexType")?
        .children
        .iter_mut()
        .find(|c| c.name == "xs:sequence")
}

/// Ordinal leaf: parallel ordered lists of integer ordinals and their
/// display symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalLeaf {
    pub meta: ComponentMeta,
    pub ordinals: Vec<i64>,
    pub symbols: Vec<String>,
    #[serde(default)]
    pub reference_ranges: Vec<Identity>,
}

impl OrdinalLeaf {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            ordinals: Vec::new(),
            symbols: Vec::new(),
            reference_ranges: Vec::new(),
        }
    }

    pub fn with_entry(mut self, ordinal: i64, symbol: impl Into<String>) -> Self {
        self.ordinals.push(ordinal);
        self.symbols.push(symbol.into());
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        if self.ordinals.is_empty() && self.symbols.is_empty() {
            return Err(FieldError::EmptyEnumeration);
        }
        if self.ordinals.len() != self.symbols.len() {
            return Err(FieldError::OrdinalSymbolMismatch {
                ordinals: self.ordinals.len(),
                symbols: self.symbols.len(),
            });
        }
        Ok(())
    }

    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let value_facets = self
            .ordinals
            .iter()
            .map(|o| emit::facet("xs:enumeration", o.to_string()))
            .collect();
        let symbol_facets = self
            .symbols
            .iter()
            .map(|s| emit::facet("xs:enumeration", s))
            .collect();
        let mut body = vec![
            emit::restricted_value("value", "xs:integer", value_facets),
            emit::restricted_value("symbol", "xs:string", symbol_facets),
        ];
        body.extend(emit::reference_range_refs(ctx, &self.meta, &self.reference_ranges));
        emit::leaf_fragment(&self.meta, body)
    }
}

/// Duration granularity a temporal leaf may record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationKind {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl DurationKind {
    pub fn name(&self) -> &'static str {
        match self {
            DurationKind::Years => "years",
            DurationKind::Months => "months",
            DurationKind::Weeks => "weeks",
            DurationKind::Days => "days",
            DurationKind::Hours => "hours",
            DurationKind::Minutes => "minutes",
            DurationKind::Seconds => "seconds",
        }
    }
}

/// Temporal leaf: which date/time/duration sub-kinds the model allows.
/// At most one duration kind, and durations are mutually exclusive with
/// the date/time kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalLeaf {
    pub meta: ComponentMeta,
    #[serde(default)]
    pub allow_date: bool,
    #[serde(default)]
    pub allow_time: bool,
    #[serde(default)]
    pub allow_date_time: bool,
    #[serde(default)]
    pub durations: Vec<DurationKind>,
    #[serde(default)]
    pub reference_ranges: Vec<Identity>,
}

impl TemporalLeaf {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(label),
            allow_date: false,
            allow_time: false,
            allow_date_time: false,
            durations: Vec::new(),
            reference_ranges: Vec::new(),
        }
    }

    pub fn date(mut self) -> Self {
        self.allow_date = true;
        self
    }

    pub fn time(mut self) -> Self {
        self.allow_time = true;
        self
    }

    pub fn date_time(mut self) -> Self {
        self.allow_date_time = true;
        self
    }

    pub fn duration(mut self, kind: DurationKind) -> Self {
        self.durations.push(kind);
        self
    }

    fn allows_point_in_time(&self) -> bool {
        self.allow_date || self.allow_time || self.allow_date_time
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        self.meta.validate()?;
        if self.durations.len() > 1 {
            return Err(FieldError::ConflictingDurationKinds);
        }
        if !self.durations.is_empty() && self.allows_point_in_time() {
            return Err(FieldError::DurationExclusivity);
        }
        if self.durations.is_empty() && !self.allows_point_in_time() {
            return Err(FieldError::EmptyTemporal);
        }
        Ok(())
    }

    pub fn emit_fragment(&self, ctx: &EmitContext<'_>) -> Fragment {
        let mut body = Vec::new();
        if self.allow_date {
            body.push(
                Node::new("xs:element")
                    .attr("name", "date")
                    .attr("type", "xs:date")
                    .attr("minOccurs", "0"),
            );
        }
        if self.allow_time {
            body.push(
                Node::new("xs:element")
                    .attr("name", "time")
                    .attr("type", "xs:time")
                    .attr("minOccurs", "0"),
            );
        }
        if self.allow_date_time {
            body.push(
                Node::new("xs:element")
                    .attr("name", "date-time")
                    .attr("type", "xs:dateTime")
                    .attr("minOccurs", "0"),
            );
        }
        for duration in &self.durations {
            body.push(
                Node::new("xs:element")
                    .attr("name", "duration")
                    .attr("type", "xs:duration")
                    .attr("kind", duration.name()),
            );
        }
        body.extend(emit::reference_range_refs(ctx, &self.meta, &self.reference_ranges));
        emit::leaf_fragment(&self.meta, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_requires_units() {
        let quantity = QuantityLeaf::new("Weight");
        assert!(matches!(
            quantity.validate(),
            Err(FieldError::MissingUnitReference { .. })
        ));
    }

    #[test]
    fn ratio_rejects_reused_unit_slot() {
        let shared = Identity::mint();
        let ratio = RatioLeaf::new("Dose rate").with_units(shared, shared, None);
        assert!(matches!(
            ratio.validate(),
            Err(FieldError::DuplicateRatioUnit { identity }) if identity == shared
        ));
    }

    #[test]
    fn ratio_accepts_three_distinct_units() {
        let ratio = RatioLeaf::new("Dose rate").with_units(
            Identity::mint(),
            Identity::mint(),
            Some(Identity::mint()),
        );
        assert!(ratio.validate().is_ok());
    }

    #[test]
    fn ordinal_lists_must_match() {
        let mut ordinal = OrdinalLeaf::new("Severity").with_entry(1, "mild");
        ordinal.symbols.push("moderate".to_string());
        assert!(matches!(
            ordinal.validate(),
            Err(FieldError::OrdinalSymbolMismatch { ordinals: 1, symbols: 2 })
        ));
    }

    #[test]
    fn temporal_duration_excludes_date_kinds() {
        let temporal = TemporalLeaf::new("Onset").date().duration(DurationKind::Days);
        assert!(matches!(
            temporal.validate(),
            Err(FieldError::DurationExclusivity)
        ));
        assert!(matches!(
            TemporalLeaf::new("Empty").validate(),
            Err(FieldError::EmptyTemporal)
        ));
        assert!(TemporalLeaf::new("Age").duration(DurationKind::Years).validate().is_ok());
    }

    #[test]
    fn inverted_bound_rejected() {
        let count = CountLeaf::new("Episodes").with_magnitude(NumericBound::inclusive(5.0, 2.0));
        assert!(matches!(
            count.validate(),
            Err(FieldError::InvertedNumericBound)
        ));
    }

    #[test]
    fn trim_float_drops_integral_fraction() {
        assert_eq!(trim_float(10.0), "10");
        assert_eq!(trim_float(2.5), "2.5");
    }
}
