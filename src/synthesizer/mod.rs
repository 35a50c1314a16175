//! Synthesizes one example data instance per published document by
//! re-walking the component graph and picking a value for every leaf
//! that satisfies its declared constraints. Unsatisfiable constraints
//! produce a placeholder plus a recorded warning, never an abort.

mod pattern;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use tracing::warn;

use crate::assembler::Node;
use crate::catalogue::{
    BlobLeaf, Component, ComponentMeta, CountLeaf, DurationKind, Identity, LinkLeaf,
    NumericBound, OrdinalLeaf, QuantityLeaf, RatioLeaf, TemporalLeaf, TextConstraint, TextLeaf,
    trim_float,
};
use crate::error::GenerationWarning;
use crate::walker::{CompilerConfig, ComponentStore};

const PLACEHOLDER_TEXT: &str = "placeholder";
const EXAMPLE_DATE: &str = "2024-01-01";
const EXAMPLE_TIME: &str = "12:00:00";
const EXAMPLE_DATE_TIME: &str = "2024-01-01T12:00:00Z";

/// Example instance mirroring the schema's element nesting, plus every
/// warning recorded while generating values.
#[derive(Debug, Clone)]
pub struct ExampleInstance {
    pub root: Node,
    pub warnings: Vec<GenerationWarning>,
}

impl ExampleInstance {
    pub fn render(&self) -> String {
        self.root.render()
    }
}

pub struct InstanceSynthesizer<'a> {
    store: &'a dyn ComponentStore,
    config: CompilerConfig,
}

impl<'a> InstanceSynthesizer<'a> {
    pub fn new(store: &'a dyn ComponentStore) -> Self {
        Self {
            store,
            config: CompilerConfig::default(),
        }
    }

    pub fn with_config(store: &'a dyn ComponentStore, config: CompilerConfig) -> Self {
        Self { store, config }
    }

    /// Build the instance for a root whose graph has already passed a
    /// walk; synthesis itself never fails.
    pub fn synthesize(&self, root: &Component) -> ExampleInstance {
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut synth = Synth {
            store: self.store,
            config: &self.config,
            rng,
            warnings: Vec::new(),
            cluster_visits: 0,
        };
        let root_node = synth.instance_of(root);
        if !synth.warnings.is_empty() {
            warn!(count = synth.warnings.len(), "instance synthesized with warnings");
        }
        ExampleInstance {
            root: root_node,
            warnings: synth.warnings,
        }
    }
}

struct Synth<'a> {
    store: &'a dyn ComponentStore,
    config: &'a CompilerConfig,
    rng: StdRng,
    warnings: Vec<GenerationWarning>,
    cluster_visits: usize,
}

impl<'a> Synth<'a> {
    fn warn(&mut self, meta: &ComponentMeta, message: impl Into<String>) {
        let identity = meta.identity.unwrap_or_else(Identity::mint);
        self.warnings
            .push(GenerationWarning::new(identity, &meta.label, message));
    }

    fn resolve(&mut self, owner: &ComponentMeta, identity: &Identity) -> Option<Component> {
        let component = self.store.get(identity);
        if component.is_none() {
            self.warn(owner, format!("referenced component {identity} is not in the store"));
        }
        component
    }

    fn instance_of(&mut self, component: &Component) -> Node {
        let meta = component.meta().clone();
        let mut node = Node::new(meta.element_name())
            .child(Node::new("label").text(&meta.label));
        match component {
            Component::Boolean(leaf) => {
                node.push(Node::new("value").text(leaf.fixed.unwrap_or(true).to_string()));
            }
            Component::Text(leaf) => {
                let value = self.text_value(leaf);
                node.push(Node::new("value").text(value));
            }
            Component::Link(leaf) => self.link_body(leaf, &mut node),
            Component::Count(leaf) => self.count_body(leaf, &mut node),
            Component::Quantity(leaf) => self.quantity_body(leaf, &mut node),
            Component::Ratio(leaf) => self.ratio_body(leaf, &mut node),
            Component::Ordinal(leaf) => self.ordinal_body(leaf, &mut node),
            Component::Temporal(leaf) => self.temporal_body(leaf, &mut node),
            Component::Blob(leaf) => self.blob_body(leaf, &mut node),
            Component::Units(units) => {
                node.push(Node::new("unit").text(&units.unit));
            }
            Component::ReferenceRange(range) => {
                node.push(Node::new("meaning").text(&range.meaning));
            }
            Component::Interval(_) => {}
            Component::Cluster(cluster) => {
                self.cluster_visits += 1;
                if self.cluster_visits > self.config.cluster_visit_ceiling {
                    self.warn(
                        &meta,
                        "cluster visit ceiling reached during synthesis; subtree omitted",
                    );
                    return node;
                }
                let members = cluster.members.clone();
                for member in &members {
                    if let Some(child) = self.resolve(&meta, member) {
                        let instance = self.instance_of(&child);
                        node.push(instance);
                    }
                }
            }
            Component::Party(party) => {
                if let Some(name) = &party.name {
                    node.push(Node::new("name").text(name));
                }
                if let Some(details) = party.details {
                    self.push_reference(&meta, &details, &mut node);
                }
                for link in &party.external_links {
                    node.push(Node::new("external-link").text(link.as_str()));
                }
            }
            Component::Audit(audit) => {
                node.push(Node::new("system-id").text(&audit.system_id));
                node.push(Node::new("change-type").text(audit.change_type.name()));
                let committed = audit
                    .time_committed
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| EXAMPLE_DATE_TIME.to_string());
                node.push(Node::new("time-committed").text(committed));
                if let Some(committer) = audit.committer {
                    self.push_reference(&meta, &committer, &mut node);
                }
            }
            Component::Attestation(attestation) => {
                node.push(Node::new("reason").text(&attestation.reason));
                if let Some(proof) = &attestation.proof {
                    node.push(Node::new("proof").text(proof.as_str()));
                }
                if let Some(attester) = attestation.attester {
                    self.push_reference(&meta, &attester, &mut node);
                }
            }
            Component::Participation(participation) => {
                node.push(Node::new("function").text(&participation.function));
                if let Some(mode) = &participation.mode {
                    node.push(Node::new("mode").text(mode));
                }
                if let Some(performer) = participation.performer {
                    self.push_reference(&meta, &performer, &mut node);
                }
            }
            Component::Entry(entry) => {
                for reference in component.references() {
                    self.push_reference(&meta, &reference, &mut node);
                }
                if let Some(workflow) = &entry.workflow {
                    node.push(Node::new("workflow").text(workflow.as_str()));
                }
                for link in &entry.links {
                    node.push(Node::new("external-link").text(link.as_str()));
                }
            }
            Component::DataModel(model) => {
                node.push(Node::new("version").text(&model.version));
                if let Some(purpose) = &model.purpose {
                    node.push(Node::new("purpose").text(purpose));
                }
                if let Some(entry) = model.entry {
                    self.push_reference(&meta, &entry, &mut node);
                }
            }
        }
        node
    }

    fn push_reference(&mut self, owner: &ComponentMeta, identity: &Identity, node: &mut Node) {
        if let Some(component) = self.resolve(owner, identity) {
            let instance = self.instance_of(&component);
            node.push(instance);
        }
    }

    fn text_value(&mut self, leaf: &TextLeaf) -> String {
        match &leaf.constraint {
            TextConstraint::Free => "text".to_string(),
            TextConstraint::Enumeration { values, default } => default
                .clone()
                .or_else(|| values.first().cloned())
                .unwrap_or_else(|| PLACEHOLDER_TEXT.to_string()),
            TextConstraint::Length { min, max, exact } => {
                let target = exact
                    .or(*min)
                    .unwrap_or_else(|| max.map_or(4, |m| m.min(4)))
                    .max(1);
                "x".repeat(target as usize)
            }
            TextConstraint::Pattern { pattern: raw } => {
                let candidate = pattern::generate(raw);
                let verified = candidate.filter(|candidate| {
                    Regex::new(&format!("^(?:{raw})$"))
                        .map(|anchored| anchored.is_match(candidate))
                        .unwrap_or(false)
                });
                match verified {
                    Some(candidate) => candidate,
                    None => {
                        self.warn(
                            &leaf.meta,
                            format!("could not generate a value matching pattern '{raw}'"),
                        );
                        PLACEHOLDER_TEXT.to_string()
                    }
                }
            }
        }
    }

    fn link_body(&mut self, leaf: &LinkLeaf, node: &mut Node) {
        node.push(Node::new("relation").text(&leaf.relation));
        let target = leaf
            .target
            .as_ref()
            .map(|t| t.as_str().to_string())
            .unwrap_or_else(|| "https://example.org/linked-resource".to_string());
        node.push(Node::new("target").text(target));
    }

    fn count_body(&mut self, leaf: &CountLeaf, node: &mut Node) {
        let magnitude = self.sample(&leaf.meta, leaf.magnitude.as_ref(), true);
        node.push(Node::new("magnitude").text(trim_float(magnitude)));
        if let Some(units) = leaf.units {
            self.push_units(&leaf.meta, &units, node);
        }
    }

    fn quantity_body(&mut self, leaf: &QuantityLeaf, node: &mut Node) {
        let magnitude = self.sample(&leaf.meta, leaf.magnitude.as_ref(), false);
        node.push(Node::new("magnitude").text(trim_float(magnitude)));
        if let Some(units) = leaf.units {
            self.push_units(&leaf.meta, &units, node);
        }
    }

    fn ratio_body(&mut self, leaf: &RatioLeaf, node: &mut Node) {
        let mut numerator = Node::new("numerator").child(
            Node::new("magnitude")
                .text(trim_float(self.sample(&leaf.meta, leaf.numerator.as_ref(), false))),
        );
        if let Some(units) = leaf.numerator_units {
            self.push_units(&leaf.meta, &units, &mut numerator);
        }
        node.push(numerator);

        let mut denominator = Node::new("denominator").child(
            Node::new("magnitude")
                .text(trim_float(self.sample(&leaf.meta, leaf.denominator.as_ref(), false))),
        );
        if let Some(units) = leaf.denominator_units {
            self.push_units(&leaf.meta, &units, &mut denominator);
        }
        node.push(denominator);

        if let Some(units) = leaf.ratio_units {
            self.push_units(&leaf.meta, &units, node);
        }
    }

    fn ordinal_body(&mut self, leaf: &OrdinalLeaf, node: &mut Node) {
        match (leaf.ordinals.first(), leaf.symbols.first()) {
            (Some(ordinal), Some(symbol)) => {
                node.push(Node::new("value").text(ordinal.to_string()));
                node.push(Node::new("symbol").text(symbol));
            }
            _ => {
                self.warn(&leaf.meta, "ordinal declares no entries to pick from");
                node.push(Node::new("value").text("0"));
            }
        }
    }

    fn temporal_body(&mut self, leaf: &TemporalLeaf, node: &mut Node) {
        if leaf.allow_date {
            node.push(Node::new("date").text(EXAMPLE_DATE));
        }
        if leaf.allow_time {
            node.push(Node::new("time").text(EXAMPLE_TIME));
        }
        if leaf.allow_date_time {
            node.push(Node::new("date-time").text(EXAMPLE_DATE_TIME));
        }
        for duration in &leaf.durations {
            let value = match duration {
                DurationKind::Years => "P1Y",
                DurationKind::Months => "P1M",
                DurationKind::Weeks => "P1W",
                DurationKind::Days => "P1D",
                DurationKind::Hours => "PT1H",
                DurationKind::Minutes => "PT1M",
                DurationKind::Seconds => "PT1S",
            };
            node.push(Node::new("duration").text(value));
        }
    }

    fn blob_body(&mut self, leaf: &BlobLeaf, node: &mut Node) {
        let media_type = leaf
            .media_types
            .first()
            .cloned()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        node.push(Node::new("media-type").text(media_type));
        node.push(Node::new("data").text("ZXhhbXBsZQ=="));
    }

    fn push_units(&mut self, owner: &ComponentMeta, identity: &Identity, node: &mut Node) {
        let mut units_node = Node::new("units").attr("idref", identity.urn());
        match self.resolve(owner, identity) {
            Some(Component::Units(units)) => {
                units_node.push(Node::new("unit").text(&units.unit));
            }
            Some(other) => {
                self.warn(
                    owner,
                    format!("units slot references a {} component", other.kind()),
                );
            }
            None => {}
        }
        node.push(units_node);
    }

    /// Uniform sample inside the tightest declared bound, falling back to
    /// the sentinel range. Exclusive sides are tightened before sampling;
    /// an empty bound yields the lower edge plus a warning.
    fn sample(&mut self, meta: &ComponentMeta, bound: Option<&NumericBound>, integral: bool) -> f64 {
        let (sentinel_lo, sentinel_hi) = self.config.sentinel_range;
        let (mut lo, mut hi, max_digits) = match bound {
            Some(bound) => {
                let mut lo = bound.min.unwrap_or(sentinel_lo);
                let mut hi = bound.max.unwrap_or(sentinel_hi.max(lo));
                if bound.min.is_some() && !bound.min_inclusive {
                    // Smallest conforming value strictly above the bound; a
                    // fractional integral bound tightens to its ceiling.
                    lo = if integral {
                        if lo.fract() == 0.0 { lo + 1.0 } else { lo.ceil() }
                    } else {
                        lo + f64::EPSILON.max(1e-6)
                    };
                }
                if bound.max.is_some() && !bound.max_inclusive {
                    hi = if integral {
                        if hi.fract() == 0.0 { hi - 1.0 } else { hi.floor() }
                    } else {
                        hi - f64::EPSILON.max(1e-6)
                    };
                }
                (lo, hi, bound.max_digits)
            }
            None => (sentinel_lo, sentinel_hi, None),
        };
        if integral {
            lo = lo.ceil();
            hi = hi.floor();
        }
        if lo > hi {
            self.warn(meta, "declared bound admits no value; emitting its lower edge");
            return lo;
        }
        let mut value = if lo == hi {
            lo
        } else {
            self.rng.random_range(lo..=hi)
        };
        if integral {
            value = value.round().clamp(lo, hi);
        }
        if let Some(digits) = max_digits {
            value = truncate_digits(value, digits, integral);
        }
        value
    }
}

/// Cap a value's total digit count. Integer parts that already exceed the
/// limit are clamped to the largest representable magnitude; otherwise the
/// fraction is truncated to the digits that remain.
fn truncate_digits(value: f64, digits: u32, integral: bool) -> f64 {
    let limit = 10f64.powi(digits as i32) - 1.0;
    let sign = if value < 0.0 { -1.0 } else { 1.0 };
    let magnitude = value.abs();
    if magnitude.trunc() > limit {
        return sign * limit;
    }
    if integral {
        return value.trunc();
    }
    let int_digits = if magnitude < 1.0 {
        1
    } else {
        magnitude.trunc().to_string().len() as u32
    };
    let frac_digits = digits.saturating_sub(int_digits);
    let scale = 10f64.powi(frac_digits as i32);
    sign * (magnitude * scale).trunc() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_caps_integer_magnitude() {
        assert_eq!(truncate_digits(12345.0, 3, true), 999.0);
        assert_eq!(truncate_digits(-12345.0, 3, true), -999.0);
    }

    #[test]
    fn truncate_trims_fraction_to_remaining_digits() {
        assert_eq!(truncate_digits(12.3456, 4, false), 12.34);
        assert_eq!(truncate_digits(0.98765, 3, false), 0.98);
    }
}
