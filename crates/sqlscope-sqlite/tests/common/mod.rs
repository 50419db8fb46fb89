#![allow(dead_code)]

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlscope_derive::Table;
use sqlscope_sqlite::{Database, DatabaseConfig};

#[derive(Debug, Clone, PartialEq, Table)]
pub struct Person {
    #[column(primary_key)]
    pub name: String,
    pub age: i64,
    pub active: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Table)]
pub struct Dog {
    #[column(primary_key)]
    pub name: String,
    #[column(references = "person.name", cascade, index)]
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Table)]
#[table(name = "Item")]
pub struct Item {
    #[column(primary_key)]
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Table)]
pub struct Visit {
    #[column(autoincrement)]
    pub id: i64,
    pub at: DateTime<Utc>,
    pub local: NaiveDateTime,
    pub payload: Option<Vec<u8>>,
}

/// An in-memory database with every test table created.
pub async fn database() -> Database {
    let db = Database::connect(&DatabaseConfig::in_memory())
        .await
        .unwrap_or_else(|e| panic!("Failed to open database: {e}"));
    db.create_table::<Person>().await.unwrap();
    db.create_table::<Dog>().await.unwrap();
    db.create_table::<Item>().await.unwrap();
    db.create_table::<Visit>().await.unwrap();
    db
}

pub fn person(name: &str, age: i64) -> Person {
    Person {
        name: String::from(name),
        age,
        active: true,
        note: None,
    }
}

pub fn jake() -> Person {
    person("Jake", 31)
}

pub fn dog(name: &str, owner: &str) -> Dog {
    Dog {
        name: String::from(name),
        owner: String::from(owner),
    }
}
