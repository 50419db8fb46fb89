#![allow(dead_code)]

use sqlscope_core::{Error, Expr, Schema, SchemaRegistry, TableQuery};
use sqlscope_derive::Table;

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
pub struct Event {
    #[column(autoincrement)]
    pub id: i64,
    pub title: String,
    pub score: Option<f64>,
}

/// A table with no primary key, for write-statement errors.
#[derive(Debug, Clone, PartialEq, Table)]
pub struct LogLine {
    pub message: String,
}

pub fn compile<T: Schema>(filter: Expr) -> TableQuery<T> {
    let registry = SchemaRegistry::new();
    TableQuery::compile(&registry, filter)
        .unwrap_or_else(|e| panic!("Failed to compile filter: {e}"))
}

pub fn compile_err<T: Schema>(filter: Expr) -> Error {
    let registry = SchemaRegistry::new();
    match TableQuery::<T>::compile(&registry, filter) {
        Ok(query) => panic!("Expected compile error, got {}", query.where_sql()),
        Err(e) => e,
    }
}

pub fn where_sql<T: Schema>(filter: Expr) -> String {
    compile::<T>(filter).where_sql().to_string()
}

pub fn jake() -> Person {
    Person {
        name: String::from("Jake"),
        age: 31,
        active: true,
        note: None,
    }
}
