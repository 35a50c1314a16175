mod common;

use common::*;
use modelclay::*;
use regex::Regex;

fn synthesize_one(component: Component) -> ExampleInstance {
    let store = StubStore::new();
    let config = CompilerConfig::default().with_seed(7);
    InstanceSynthesizer::with_config(&store, config).synthesize(&component)
}

fn value_text(instance: &ExampleInstance) -> &str {
    instance
        .root
        .find("value")
        .and_then(|n| n.text.as_deref())
        .unwrap()
}

#[test]
fn enumeration_prefers_the_declared_default() {
    let leaf = TextLeaf::new("Blood group").with_constraint(TextConstraint::Enumeration {
        values: vec!["A".into(), "B".into(), "O".into()],
        default: Some("O".into()),
    });
    let instance = synthesize_one(Component::Text(leaf));
    assert_eq!(value_text(&instance), "O");
    assert!(instance.warnings.is_empty());
}

#[test]
fn enumeration_without_default_picks_a_listed_value() {
    let leaf = TextLeaf::new("Blood group").with_constraint(TextConstraint::Enumeration {
        values: vec!["A".into(), "B".into()],
        default: None,
    });
    let instance = synthesize_one(Component::Text(leaf));
    assert_eq!(value_text(&instance), "A");
}

#[test]
fn pattern_value_matches_the_declared_pattern() {
    let pattern = r"[A-Z]{2}\d{4}";
    let leaf = TextLeaf::new("Case id").with_constraint(TextConstraint::Pattern {
        pattern: pattern.to_string(),
    });
    let instance = synthesize_one(Component::Text(leaf));
    let anchored = Regex::new(&format!("^(?:{pattern})$")).unwrap();
    assert!(anchored.is_match(value_text(&instance)));
    assert!(instance.warnings.is_empty());
}

#[test]
fn length_constraint_pads_to_the_minimum() {
    let leaf = TextLeaf::new("Code").with_constraint(TextConstraint::Length {
        min: Some(6),
        max: Some(10),
        exact: None,
    });
    let instance = synthesize_one(Component::Text(leaf));
    assert_eq!(value_text(&instance).len(), 6);
}

#[test]
fn pinned_bound_produces_the_exact_value() {
    let leaf = CountLeaf::new("Tablets").with_magnitude(NumericBound::inclusive(10.0, 10.0));
    let instance = synthesize_one(Component::Count(leaf));
    let magnitude = instance.root.find("magnitude").unwrap();
    assert_eq!(magnitude.text.as_deref(), Some("10"));
}

#[test]
fn count_magnitude_is_integral_and_inside_the_bound() {
    let leaf = CountLeaf::new("Tablets").with_magnitude(NumericBound::inclusive(2.0, 8.0));
    let instance = synthesize_one(Component::Count(leaf));
    let magnitude: i64 = instance
        .root
        .find("magnitude")
        .and_then(|n| n.text.as_deref())
        .unwrap()
        .parse()
        .unwrap();
    assert!((2..=8).contains(&magnitude));
}

#[test]
fn exclusive_fractional_bound_tightens_to_the_nearest_integer() {
    let bound = NumericBound {
        min: Some(2.5),
        min_inclusive: false,
        max: Some(3.5),
        max_inclusive: false,
        max_digits: None,
    };
    let leaf = CountLeaf::new("Episodes").with_magnitude(bound);
    let instance = synthesize_one(Component::Count(leaf));
    // The only integer strictly inside (2.5, 3.5) is 3.
    let magnitude = instance.root.find("magnitude").unwrap();
    assert_eq!(magnitude.text.as_deref(), Some("3"));
}

#[test]
fn digit_limit_truncates_the_sampled_value() {
    let bound = NumericBound::inclusive(123.456, 123.456).with_max_digits(4);
    let leaf = QuantityLeaf::new("Dose")
        .with_magnitude(bound)
        .with_units(Identity::mint());
    let instance = synthesize_one(Component::Quantity(leaf));
    let magnitude = instance
        .root
        .find("magnitude")
        .and_then(|n| n.text.as_deref())
        .unwrap();
    assert_eq!(magnitude, "123.4");
}

#[test]
fn temporal_emits_only_the_allowed_kinds() {
    let leaf = TemporalLeaf::new("Onset").date();
    let instance = synthesize_one(Component::Temporal(leaf));
    assert!(instance.root.find("date").is_some());
    assert!(instance.root.find("time").is_none());
    assert!(instance.root.find("date-time").is_none());
}

#[test]
fn unsatisfiable_pattern_degrades_to_a_placeholder_warning() {
    // Valid regex, but nothing can match it.
    let leaf = TextLeaf::new("Impossible").with_constraint(TextConstraint::Pattern {
        pattern: r"a\bz".to_string(),
    });
    let instance = synthesize_one(Component::Text(leaf));
    assert_eq!(value_text(&instance), "placeholder");
    assert_eq!(instance.warnings.len(), 1);
    assert_eq!(instance.warnings[0].label, "Impossible");
}

#[test]
fn seeded_synthesis_is_deterministic() {
    let store = StubStore::new();
    let config = CompilerConfig::default().with_seed(42);
    let leaf = Component::Count(CountLeaf::new("Tablets").with_magnitude(
        NumericBound::inclusive(1.0, 1000.0),
    ));
    let first = InstanceSynthesizer::with_config(&store, config.clone()).synthesize(&leaf);
    let second = InstanceSynthesizer::with_config(&store, config).synthesize(&leaf);
    assert_eq!(first.root, second.root);
}

#[test]
fn missing_units_reference_is_a_warning_not_an_abort() {
    let leaf = QuantityLeaf::new("Dose").with_units(Identity::mint());
    let instance = synthesize_one(Component::Quantity(leaf));
    assert!(instance.root.find("magnitude").is_some());
    assert_eq!(instance.warnings.len(), 1);
}
