mod common;

use common::*;
use modelclay::*;

fn collect_named<'a>(node: &'a Node, name: &str, out: &mut Vec<&'a Node>) {
    if node.name == name {
        out.push(node);
    }
    for child in &node.children {
        collect_named(child, name, out);
    }
}

#[test]
fn publish_locks_the_component_against_mutation() {
    let store = MemoryComponentStore::new();
    let publisher = Publisher::new(&store);

    let handle = store.insert_draft(create_test_boolean("Smoker"));
    store
        .update_draft(handle, |component| {
            component.meta_mut().description = Some("Current smoking status".to_string());
            Ok(())
        })
        .unwrap();

    let identity = publisher.publish(handle).unwrap();

    // The draft handle is consumed; the only way to change the component
    // now is an explicit reset.
    assert!(matches!(
        store.update_draft(handle, |_| Ok(())),
        Err(CompileError::UnknownDraft { .. })
    ));
    let published = store.get(&identity).unwrap();
    assert_eq!(published.identity(), Some(identity));
    assert!(published.meta().ensure_mutable().is_err());
}

#[test]
fn identity_survives_every_read_until_reset() {
    let store = MemoryComponentStore::new();
    let publisher = Publisher::new(&store);

    let identity = publisher
        .publish(store.insert_draft(create_test_boolean("Smoker")))
        .unwrap();
    for _ in 0..3 {
        assert_eq!(store.get(&identity).unwrap().identity(), Some(identity));
    }

    let fresh = publisher.reset(identity).unwrap();
    let republished = publisher.publish(fresh).unwrap();
    assert_ne!(republished, identity, "retired identities are never reused");
    assert!(store.get(&identity).is_none());
    assert!(store.is_retired(&identity));
}

#[test]
fn invalid_draft_never_reaches_published() {
    let store = MemoryComponentStore::new();
    let publisher = Publisher::new(&store);

    let text = TextLeaf::new("Blood group").with_constraint(TextConstraint::Enumeration {
        values: Vec::new(),
        default: None,
    });
    let handle = store.insert_draft(Component::Text(text));
    let result = publisher.publish(handle);

    assert!(matches!(
        result,
        Err(CompileError::Field {
            source: FieldError::EmptyEnumeration,
            ..
        })
    ));
    assert_eq!(store.published_count(), 0);
    assert!(store.draft(handle).is_some());
}

#[test]
fn compiled_model_defines_every_identity_once() {
    let store = MemoryComponentStore::new();
    let publisher = Publisher::new(&store);

    let mg = publisher
        .publish(store.insert_draft(Component::Units(UnitsDef::new("milligram", "mg"))))
        .unwrap();
    let morning = publisher
        .publish(store.insert_draft(Component::Count(
            CountLeaf::new("Morning dose")
                .with_magnitude(NumericBound::inclusive(10.0, 10.0))
                .with_units(mg),
        )))
        .unwrap();
    let evening = publisher
        .publish(store.insert_draft(Component::Count(
            CountLeaf::new("Evening dose")
                .with_magnitude(NumericBound::inclusive(10.0, 10.0))
                .with_units(mg),
        )))
        .unwrap();
    let cluster = publisher
        .publish(store.insert_draft(create_test_cluster("Dosage", &[morning, evening])))
        .unwrap();
    let entry = publish_test_entry(&store, &publisher, cluster);
    let handle = store.insert_draft(Component::DataModel(
        DataModelDef::new("Medication record", "1.0.0").with_entry(entry),
    ));

    let output = publisher.publish_model(handle).unwrap();

    // mg is reached through both counts but defined exactly once.
    let names = output.document.defined_names();
    let mg_definitions = names.iter().filter(|n| n.starts_with("milligram.")).count();
    assert_eq!(mg_definitions, 1);
    output.document.validate_structure().unwrap();

    // Both synthesized magnitudes are pinned to exactly 10 by the bound.
    let mut magnitudes = Vec::new();
    collect_named(&output.instance.root, "magnitude", &mut magnitudes);
    assert_eq!(magnitudes.len(), 2);
    for magnitude in magnitudes {
        assert_eq!(magnitude.text.as_deref(), Some("10"));
    }

    // The unit text appears in the instance via the units reference.
    let mut units = Vec::new();
    collect_named(&output.instance.root, "unit", &mut units);
    assert!(units.iter().all(|u| u.text.as_deref() == Some("mg")));
    assert!(output.instance.warnings.is_empty());
}

#[test]
fn substitution_groups_carry_the_union_of_roles() {
    let store = MemoryComponentStore::new();
    let publisher = Publisher::new(&store);

    let tablets = publisher
        .publish(store.insert_draft(Component::Count(CountLeaf::new("Tablets"))))
        .unwrap();
    let tabs = publisher
        .publish(store.insert_draft(create_test_cluster("Tabs", &[tablets])))
        .unwrap();
    let pack = publisher
        .publish(store.insert_draft(create_test_cluster("Pack", &[tabs])))
        .unwrap();
    let subject = publisher
        .publish(store.insert_draft(Component::Party(PartyDef::new("Subject"))))
        .unwrap();
    let provider = publisher
        .publish(store.insert_draft(Component::Party(PartyDef::new("Provider"))))
        .unwrap();
    let entry = publisher
        .publish(store.insert_draft(Component::Entry(
            EntryDef::new("Dispense")
                .with_payload(pack)
                .with_subject(subject)
                .with_provider(provider)
                .with_protocol(tabs),
        )))
        .unwrap();
    let handle = store.insert_draft(Component::DataModel(
        DataModelDef::new("Dispense record", "1.0.0").with_entry(entry),
    ));

    let output = publisher.publish_model(handle).unwrap();

    let mut declarations = Vec::new();
    collect_named(&output.document.substitution_groups, "identity", &mut declarations);
    let tabs_roles = declarations
        .iter()
        .find(|n| n.attr_value("about") == Some(tabs.urn().as_str()))
        .and_then(|n| n.attr_value("roles"))
        .unwrap();
    assert_eq!(tabs_roles, "standalone in-cluster");
}

#[test]
fn units_slot_rejects_a_component_of_the_wrong_kind() {
    let store = MemoryComponentStore::new();
    let publisher = Publisher::new(&store);

    let smoker = publisher
        .publish(store.insert_draft(create_test_boolean("Smoker")))
        .unwrap();
    let handle = store.insert_draft(Component::Quantity(
        QuantityLeaf::new("Dose").with_units(smoker),
    ));

    let result = publisher.publish(handle);
    match result {
        Err(CompileError::SlotKindMismatch { slot, expected, found, .. }) => {
            assert_eq!(slot, "units");
            assert_eq!(expected, "units");
            assert_eq!(found, "boolean");
        }
        other => panic!("expected a slot-kind mismatch, got {other:?}"),
    }
    assert!(store.draft(handle).is_some(), "failed publish keeps the draft");
}

#[test]
fn model_publish_failure_keeps_the_root_draft() {
    let store = MemoryComponentStore::new();
    let publisher = Publisher::new(&store);

    let ghost = Identity::mint();
    let handle = store.insert_draft(Component::DataModel(
        DataModelDef::new("Broken", "0.1.0").with_entry(ghost),
    ));

    let result = publisher.publish_model(handle);
    assert!(result.is_err());
    assert!(store.draft(handle).is_some());
    assert_eq!(store.published_count(), 0);
}
