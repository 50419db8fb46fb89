//! Tests for the `#[derive(Table)]` macro output.

mod common;

use common::{jake, Dog, Event, Item, Person};
use sqlscope_core::schema::{ForeignKey, IndexKind};
use sqlscope_core::{Kind, Schema, SchemaRegistry, SqlValue};
use sqlscope_derive::Table;

// =============================================================================
// Table names
// =============================================================================

#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
pub struct PetOwner {
    #[column(primary_key)]
    pub id: i64,
}

#[test]
fn test_default_table_name_is_snake_case() {
    assert_eq!(Person::TABLE, "person");
    assert_eq!(PetOwner::TABLE, "pet_owner");
}

#[test]
fn test_explicit_table_name() {
    assert_eq!(Item::TABLE, "Item");
}

// =============================================================================
// Column descriptors
// =============================================================================

#[test]
fn test_person_columns() {
    let names: Vec<_> = Person::COLUMNS.iter().map(|c| c.name).collect();
    assert_eq!(names, ["name", "age", "active", "note"]);

    let kinds: Vec<_> = Person::COLUMNS.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        [Kind::Text, Kind::Integer, Kind::Boolean, Kind::Text.nullable()]
    );

    assert!(Person::COLUMNS[0].primary_key);
    assert!(!Person::COLUMNS[1].primary_key);
}

#[test]
fn test_foreign_key_and_index() {
    let owner = Dog::COLUMNS[1];
    assert_eq!(
        owner.references,
        Some(ForeignKey {
            table: "person",
            column: "name"
        })
    );
    assert!(owner.cascade);
    assert_eq!(owner.index, IndexKind::Index);
}

#[test]
fn test_autoincrement_implies_primary_key() {
    let id = Event::COLUMNS[0];
    assert!(id.autoincrement);
    assert!(id.primary_key);
    assert_eq!(Event::COLUMNS[2].kind, Kind::Real.nullable());
}

#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
pub struct Account {
    #[column(primary_key, name = "account_id")]
    pub id: i64,
    #[column(unique)]
    pub r#type: String,
}

#[test]
fn test_renamed_and_raw_columns() {
    let names: Vec<_> = Account::COLUMNS.iter().map(|c| c.name).collect();
    assert_eq!(names, ["account_id", "type"]);
    assert_eq!(Account::COLUMNS[1].index, IndexKind::Unique);
}

#[test]
fn test_derived_schema_registers() {
    let registry = SchemaRegistry::new();
    let descriptor = registry.register::<Dog>().unwrap();
    assert_eq!(descriptor.name(), "dog");
    let keys: Vec<_> = descriptor.primary_keys().map(|c| c.name).collect();
    assert_eq!(keys, ["name"]);
}

// =============================================================================
// Marshalling
// =============================================================================

#[test]
fn test_values_round_trip() {
    let person = Person {
        note: Some(String::from("likes dogs")),
        ..jake()
    };
    let values = person.to_values();
    assert_eq!(values[2], SqlValue::Bool(true));
    assert_eq!(Person::from_values(values).unwrap(), person);
}

#[test]
fn test_from_values_accepts_integer_booleans() {
    let person = Person::from_values(vec![
        SqlValue::Text(String::from("Jake")),
        SqlValue::Int(31),
        SqlValue::Int(1),
        SqlValue::Null,
    ])
    .unwrap();
    assert_eq!(person, jake());
}

#[test]
fn test_from_values_short_row() {
    let err = Dog::from_values(vec![SqlValue::Text(String::from("Rex"))]).unwrap_err();
    assert!(err.to_string().contains("a value for column owner"));
}

// =============================================================================
// Column accessors
// =============================================================================

#[test]
fn test_accessor_records_call_site() {
    let expr = Person::age();
    assert_eq!(expr.location().file(), file!());
    assert_eq!(expr.location().line(), line!() - 2);
}
