//! End-to-end tests for existence checks and saving.

use std::time::Duration;

use openminds_kg::schemas::{self, ContactInformation, Dataset, Organization, Person};
use openminds_kg::{
    Document, Error, ExistenceCheck, FixedRetry, MemoryTransport, Retrying, Session,
    SessionConfig, Transport, ValidationMode,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const PERSON: &str = "https://openminds.ebrains.eu/core/Person";
const GIVEN_NAME: &str = "https://openminds.ebrains.eu/vocab/givenName";
const FAMILY_NAME: &str = "https://openminds.ebrains.eu/vocab/familyName";
const ALTERNATE_NAME: &str = "https://openminds.ebrains.eu/vocab/alternateName";
const AUTHOR: &str = "https://openminds.ebrains.eu/vocab/author";
const DESCRIPTION: &str = "https://openminds.ebrains.eu/vocab/description";
const SPACE: &str = "https://core.kg.ebrains.eu/vocab/meta/space";

fn doc(v: serde_json::Value) -> Document {
    v.as_object().cloned().expect("object literal")
}

fn lovelace() -> Person {
    let p = Person::new("Ada");
    p.set_family_name("Lovelace");
    p
}

// ============================================================================
// 1. Creation happens at most once
// ============================================================================

#[test]
fn test_equivalent_objects_create_one_node() {
    let kg = MemoryTransport::new();
    let mut session = Session::new(kg.clone(), schemas::registry());

    let first = lovelace();
    session.save(first.entity(), true).unwrap();
    let id = first.id().expect("identifier after save");

    let second = lovelace();
    session.save(second.entity(), true).unwrap();
    assert_eq!(second.id(), Some(id.clone()));

    // A fresh session finds the node through the existence query too.
    let mut other = Session::new(kg.clone(), schemas::registry());
    let third = lovelace();
    other.save(third.entity(), true).unwrap();
    assert_eq!(third.id(), Some(id));

    assert_eq!(kg.calls().create, 1);
    assert_eq!(kg.count_of_type(PERSON), 1);
}

#[test]
fn test_saved_entity_is_cached() {
    let kg = MemoryTransport::new();
    let mut session = Session::new(kg.clone(), schemas::registry());
    let ada = lovelace();
    session.save(ada.entity(), true).unwrap();

    let id = ada.id().unwrap();
    let found = session.get(Person::SCHEMA, &id).unwrap();
    assert!(found.ptr_eq(ada.entity()));
    assert_eq!(kg.calls().get_by_id, 0);
}

#[test]
fn test_partial_key_creates_one_node() {
    let kg = MemoryTransport::new();
    let mut session = Session::new(kg.clone(), schemas::registry());

    // Family name is part of the key but unset on both.
    let first = Person::new("Ada");
    let second = Person::new("Ada");
    session.save(first.entity(), true).unwrap();
    session.save(second.entity(), true).unwrap();

    assert_eq!(kg.calls().create, 1);
    assert_eq!(kg.calls().filter, 2);
    assert_eq!(second.id(), first.id());
}

#[test]
fn test_unset_key_property_must_be_unset_remotely() {
    let kg = MemoryTransport::new();
    kg.insert(
        doc(json!({"@type": PERSON, GIVEN_NAME: "Ada", FAMILY_NAME: "Lovelace"})),
        "common",
        true,
    );
    let mut session = Session::new(kg.clone(), schemas::registry());

    let ada = Person::new("Ada");
    assert!(!session.exists(ada.entity()).unwrap());
    assert_eq!(kg.calls().filter, 1);

    session.save(ada.entity(), true).unwrap();
    assert_eq!(kg.count_of_type(PERSON), 2);
}

#[test]
fn test_exists_without_key_values_is_false() {
    let kg = MemoryTransport::new();
    let config = SessionConfig::default().with_validation(ValidationMode::Off);
    let mut session = Session::with_config(kg.clone(), schemas::registry(), config);

    let unnamed =
        openminds_kg::Entity::new(Person::SCHEMA).with(&Person::ALTERNATE_NAMES, vec!["Ada"]);
    let unnamed = Person::from_entity(unnamed.into()).unwrap();
    assert!(!session.exists(unnamed.entity()).unwrap());
    assert_eq!(kg.calls().filter, 0);
}

#[test]
fn test_existing_node_with_exists_ok_false() {
    let kg = MemoryTransport::new();
    let remote = kg.insert(
        doc(json!({"@type": PERSON, GIVEN_NAME: "Ada", FAMILY_NAME: "Lovelace"})),
        "common",
        true,
    );
    let mut session = Session::new(kg.clone(), schemas::registry());

    let ada = lovelace();
    let err = session.save(ada.entity(), false).unwrap_err();
    match err {
        Error::ResourceExists { type_name, id } => {
            assert_eq!(type_name, "Person");
            assert_eq!(id, remote);
        }
        other => panic!("expected ResourceExists, got {other}"),
    }
    assert_eq!(kg.calls().create, 0);
}

#[test]
fn test_ambiguous_existence_is_fatal() {
    let kg = MemoryTransport::new();
    for space in ["common", "private"] {
        kg.insert(
            doc(json!({"@type": PERSON, GIVEN_NAME: "Ada", FAMILY_NAME: "Lovelace"})),
            space,
            true,
        );
    }
    let mut session = Session::new(kg.clone(), schemas::registry());

    let ada = lovelace();
    let err = session.save(ada.entity(), true).unwrap_err();
    assert!(matches!(err, Error::AmbiguousIdentity { matches: 2, .. }));
    assert!(ada.id().is_none());
    assert_eq!(kg.calls().create, 0);
}

// ============================================================================
// 2. Existence check modes
// ============================================================================

#[test]
fn test_key_only_adopts_despite_differences() {
    let kg = MemoryTransport::new();
    let remote = kg.insert(
        doc(json!({
            "@type": PERSON,
            GIVEN_NAME: "Ada",
            FAMILY_NAME: "Lovelace",
            ALTERNATE_NAME: ["Countess of Lovelace"],
        })),
        "common",
        true,
    );
    let mut session = Session::new(kg.clone(), schemas::registry());

    let ada = lovelace();
    ada.set_alternate_names(&["Augusta Ada King"]);
    assert!(session.exists(ada.entity()).unwrap());
    assert_eq!(ada.id(), Some(remote));
    assert_eq!(ada.entity().read().space(), Some("common"));
}

#[test]
fn test_strict_check_reports_conflicts() {
    let kg = MemoryTransport::new();
    kg.insert(
        doc(json!({
            "@type": PERSON,
            GIVEN_NAME: "Ada",
            FAMILY_NAME: "Lovelace",
            ALTERNATE_NAME: ["Countess of Lovelace"],
        })),
        "common",
        true,
    );
    let config = SessionConfig::default().with_existence_check(ExistenceCheck::Strict);
    let mut session = Session::with_config(kg.clone(), schemas::registry(), config);

    let differing = lovelace();
    differing.set_alternate_names(&["Augusta Ada King"]);
    match session.exists(differing.entity()).unwrap_err() {
        Error::IdentityConflict { mismatched, .. } => {
            assert_eq!(mismatched, vec!["alternate_names".to_owned()]);
        }
        other => panic!("expected IdentityConflict, got {other}"),
    }
    assert!(differing.id().is_none());

    let agreeing = lovelace();
    agreeing.set_alternate_names(&["Countess of Lovelace"]);
    assert!(session.exists(agreeing.entity()).unwrap());
}

// ============================================================================
// 3. Save paths
// ============================================================================

#[test]
fn test_save_creates_linked_nodes_first() {
    let kg = MemoryTransport::new();
    let mut session = Session::new(kg.clone(), schemas::registry());

    let ada = lovelace();
    let contact = ContactInformation::new("ada@example.org");
    ada.set_contact_information(&contact);
    let society = Organization::new("Analytical Society");
    let notes = Dataset::new("Notes on the Analytical Engine");
    notes.add_author(&ada);
    notes.add_custodian(&society);

    session.save(notes.entity(), false).unwrap();
    assert_eq!(kg.calls().create, 4);

    let ada_id = ada.id().unwrap();
    let stored = kg.document(&notes.id().unwrap()).unwrap();
    assert_eq!(stored[AUTHOR], json!([{"@id": ada_id.as_str(), "@type": PERSON}]));

    // Each node lands in its type's default space.
    let spaces: Vec<Option<String>> = [ada.entity(), contact.entity(), society.entity(), notes.entity()]
        .iter()
        .map(|e| e.read().space().map(str::to_owned))
        .collect();
    assert_eq!(
        spaces,
        vec![
            Some("common".to_owned()),
            Some("restricted".to_owned()),
            Some("common".to_owned()),
            Some("dataset".to_owned()),
        ]
    );
    assert_eq!(kg.document(&ada_id).unwrap()[SPACE], "common");
}

#[test]
fn test_save_with_id_updates() {
    let kg = MemoryTransport::new();
    let mut session = Session::new(kg.clone(), schemas::registry());

    let notes = Dataset::new("Notes");
    session.save(notes.entity(), false).unwrap();
    notes.set_description("Translated from Menabrea, with notes.");
    session.save(notes.entity(), false).unwrap();

    assert_eq!(kg.calls().create, 1);
    assert_eq!(kg.calls().update, 1);
    let stored = kg.document(&notes.id().unwrap()).unwrap();
    assert_eq!(stored[DESCRIPTION], "Translated from Menabrea, with notes.");
}

#[test]
fn test_explicit_space_wins() {
    let kg = MemoryTransport::new();
    let mut session = Session::new(kg.clone(), schemas::registry());

    let entity = openminds_kg::Entity::new(Person::SCHEMA)
        .with(&Person::GIVEN_NAME, "Ada")
        .with_space("private");
    let ada = Person::from_entity(entity.into()).unwrap();
    session.save(ada.entity(), true).unwrap();
    assert_eq!(kg.document(&ada.id().unwrap()).unwrap()[SPACE], "private");
}

#[test]
fn test_unsaved_cycle_is_reported() {
    let kg = MemoryTransport::new();
    let mut session = Session::new(kg.clone(), schemas::registry());

    let a = Organization::new("A");
    let b = Organization::new("B");
    a.add_parent(&b);
    b.add_parent(&a);

    let err = session.save(a.entity(), true).unwrap_err();
    assert!(matches!(err, Error::UnsavedReference { ref property, .. } if property == "has_parents"));
    assert_eq!(kg.calls().create, 0);
}

#[test]
fn test_invalid_entity_is_not_created() {
    let kg = MemoryTransport::new();
    let config = SessionConfig::default().with_validation(ValidationMode::Error);
    let mut session = Session::with_config(kg.clone(), schemas::registry(), config);

    let nameless = Person::new("Ada");
    nameless.entity().write().remove("given_name");
    let err = session.save(nameless.entity(), true).unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert!(kg.is_empty());
}

#[test]
fn test_save_through_retrying_transport() {
    let kg = MemoryTransport::new();
    let transport = Retrying::new(kg.clone(), FixedRetry::new(3, Duration::ZERO));
    let mut session = Session::new(transport, schemas::registry());

    let ada = lovelace();
    session.save(ada.entity(), true).unwrap();
    let id = ada.id().unwrap();
    assert!(session
        .transport()
        .get_by_id(&id, openminds_kg::ReleaseStatus::InProgress)
        .unwrap()
        .is_some());
}
