//! End-to-end execution against an in-memory SQLite database.

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{database, dog, jake, person, Dog, Item, Person, Visit};
use sqlscope_core::{
    col, exists, filter, param, val, Error as CoreError, LazyQuery, Order, SqlValue,
};
use sqlscope_sqlite::Error;

// =============================================================================
// Round trips
// =============================================================================

#[tokio::test]
async fn test_person_round_trip() {
    let db = database().await;
    db.insert(&jake()).await.unwrap();

    let query = db.query::<Person>(col("name").eq(val("Jake"))).unwrap();
    assert_eq!(query.where_sql(), "person.name = ?1");
    assert_eq!(
        query.bind(&[]).unwrap(),
        vec![SqlValue::Text(String::from("Jake"))]
    );

    assert_eq!(db.find(&query, &[]).await.unwrap(), jake());
}

#[tokio::test]
async fn test_nullable_column_round_trip() {
    let db = database().await;
    let finn = Person {
        note: Some(String::from("it's adventure time")),
        active: false,
        ..person("Finn", 14)
    };
    db.insert(&finn).await.unwrap();

    let query = db.query::<Person>(col("note").is_not_null()).unwrap();
    assert_eq!(db.find(&query, &[]).await.unwrap(), finn);
}

#[tokio::test]
async fn test_item_price_scenario() {
    let db = database().await;
    db.insert(&Item {
        name: String::from("Lamp"),
        price: 9.0,
    })
    .await
    .unwrap();

    let query = db.query::<Item>(col("price").gt(val(5.0))).unwrap();
    assert_eq!(query.where_sql(), "Item.price > ?1");
    assert_eq!(query.bind(&[]).unwrap(), vec![SqlValue::Float(5.0)]);

    let lamp = db.find(&query, &[]).await.unwrap();
    assert_eq!(lamp.name, "Lamp");
    assert_eq!(lamp.price, 9.0);
}

#[tokio::test]
async fn test_time_values_round_trip() {
    let db = database().await;
    let visit = Visit {
        id: 0,
        at: Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap(),
        local: NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_milli_opt(10, 30, 0, 250)
            .unwrap(),
        payload: Some(vec![0xDE, 0xAD]),
    };
    let id = db.insert(&visit).await.unwrap();
    assert_eq!(id, 1);

    let query = db.query::<Visit>(col("id").eq(param::<i64>("id"))).unwrap();
    let stored = db.find(&query, &[SqlValue::Int(id)]).await.unwrap();
    assert_eq!(stored, Visit { id, ..visit });
}

// =============================================================================
// Finders
// =============================================================================

#[tokio::test]
async fn test_find_missing_row() {
    let db = database().await;
    let query = db
        .query::<Person>(col("name").eq(param::<String>("name")))
        .unwrap();
    let args = [SqlValue::Text(String::from("Nobody"))];

    let err = db.find(&query, &args).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "no row found in person");
    assert_eq!(db.find_optional(&query, &args).await.unwrap(), None);
}

#[tokio::test]
async fn test_find_all_respects_order() {
    let db = database().await;
    for (name, age) in [("Jake", 31), ("Finn", 14), ("Marceline", 1003)] {
        db.insert(&person(name, age)).await.unwrap();
    }

    let query = db
        .query::<Person>(col("age").ge(param::<i64>("min")))
        .unwrap()
        .order_by([Order::desc("age")])
        .unwrap();
    let names: Vec<_> = db
        .find_all(&query, &[SqlValue::Int(18)])
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["Marceline", "Jake"]);

    let by_age_then_name = query.order_by([Order::asc("name")]).unwrap();
    let first = db.find(&by_age_then_name, &[SqlValue::Int(0)]).await.unwrap();
    assert_eq!(first.name, "Marceline");
}

#[tokio::test]
async fn test_lazy_query_executes() {
    static BY_OWNER: LazyQuery<Dog> = LazyQuery::new(|| col("owner").eq(param::<String>("owner")));

    let db = database().await;
    db.insert(&jake()).await.unwrap();
    db.insert(&dog("Lady", "Jake")).await.unwrap();

    let query = BY_OWNER.get(db.registry()).unwrap();
    let dogs = db
        .find_all(query, &[SqlValue::Text(String::from("Jake"))])
        .await
        .unwrap();
    assert_eq!(dogs, vec![dog("Lady", "Jake")]);
}

#[tokio::test]
async fn test_reused_and_nested_parameters_bind_once() {
    let db = database().await;
    for (name, age) in [("Jake", 31), ("Finn", 14), ("Marceline", 1003)] {
        db.insert(&person(name, age)).await.unwrap();
    }
    for (name, owner) in [("Lady", "Jake"), ("Bubble", "Finn"), ("Rex", "Marceline")] {
        db.insert(&dog(name, owner)).await.unwrap();
    }

    let query = db
        .query::<Person>(
            col("age")
                .ge(param::<i64>("age"))
                .or(col("age").eq(param::<i64>("age")))
                .and(exists(filter::<Dog>(
                    col("owner")
                        .eq(Person::name())
                        .and(col("name").ne(param::<String>("dog"))),
                ))),
        )
        .unwrap();
    assert_eq!(
        query.where_sql(),
        "(person.age >= ?1 OR person.age = ?1) AND \
         EXISTS(SELECT 1 FROM dog WHERE dog.owner = person.name AND dog.name != ?2 LIMIT 1)"
    );
    assert_eq!(query.params().len(), 2);

    let names: Vec<_> = db
        .find_all(&query, &[SqlValue::Int(18), SqlValue::Text(String::from("Rex"))])
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["Jake"]);
}

// =============================================================================
// Exists and delete
// =============================================================================

#[tokio::test]
async fn test_exists() {
    let db = database().await;
    db.insert(&jake()).await.unwrap();
    db.insert(&person("Finn", 14)).await.unwrap();
    db.insert(&dog("Lady", "Jake")).await.unwrap();

    let query = db.query::<Person>(col("age").lt(param::<i64>("max"))).unwrap();
    assert!(db.exists(&query, &[SqlValue::Int(20)]).await.unwrap());
    assert!(!db.exists(&query, &[SqlValue::Int(10)]).await.unwrap());

    let owners = db
        .query::<Person>(exists(filter::<Dog>(col("owner").eq(Person::name()))))
        .unwrap();
    let names: Vec<_> = db
        .find_all(&owners, &[])
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["Jake"]);
}

#[tokio::test]
async fn test_delete_counts_rows() {
    let db = database().await;
    for (name, age) in [("Jake", 31), ("Finn", 14), ("BMO", 2)] {
        db.insert(&person(name, age)).await.unwrap();
    }

    let query = db.query::<Person>(col("age").lt(val(20))).unwrap();
    assert_eq!(db.delete(&query, &[]).await.unwrap(), 2);
    assert!(!db.exists(&query, &[]).await.unwrap());
}

#[tokio::test]
async fn test_delete_cascades_to_dogs() {
    let db = database().await;
    db.insert(&jake()).await.unwrap();
    db.insert(&person("Finn", 14)).await.unwrap();
    db.insert(&dog("Lady", "Jake")).await.unwrap();
    db.insert(&dog("Jake Jr", "Jake")).await.unwrap();
    db.insert(&dog("Shoko", "Finn")).await.unwrap();

    let jake_only = db.query::<Person>(col("name").eq(val("Jake"))).unwrap();
    assert_eq!(db.delete(&jake_only, &[]).await.unwrap(), 1);

    let all_dogs = db.query::<Dog>(col("name").like(val("%"))).unwrap();
    let dogs = db.find_all(&all_dogs, &[]).await.unwrap();
    assert_eq!(dogs, vec![dog("Shoko", "Finn")]);
}

#[tokio::test]
async fn test_foreign_key_enforced() {
    let db = database().await;
    let err = db.insert(&dog("Stray", "Nobody")).await.unwrap_err();
    assert!(matches!(err, Error::Database(_)));
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_upsert_inserts_then_updates() {
    let db = database().await;
    db.upsert(&jake()).await.unwrap();
    db.upsert(&Person { age: 32, ..jake() }).await.unwrap();

    let query = db.query::<Person>(col("name").eq(val("Jake"))).unwrap();
    assert_eq!(db.find(&query, &[]).await.unwrap().age, 32);
    assert_eq!(db.delete(&query, &[]).await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_by_primary_key() {
    let db = database().await;
    db.insert(&jake()).await.unwrap();

    let older = Person {
        age: 40,
        note: Some(String::from("older")),
        ..jake()
    };
    assert_eq!(db.update(&older).await.unwrap(), 1);
    assert_eq!(db.update(&person("Nobody", 1)).await.unwrap(), 0);

    let query = db.query::<Person>(col("name").eq(val("Jake"))).unwrap();
    assert_eq!(db.find(&query, &[]).await.unwrap(), older);
}

#[tokio::test]
async fn test_duplicate_insert_fails() {
    let db = database().await;
    db.insert(&jake()).await.unwrap();
    assert!(matches!(
        db.insert(&jake()).await,
        Err(Error::Database(_))
    ));
}

// =============================================================================
// Errors raised before execution
// =============================================================================

#[tokio::test]
async fn test_argument_count_checked_before_execution() {
    let db = database().await;
    let query = db.query::<Person>(col("age").gt(param::<i64>("min"))).unwrap();
    let err = db.find_all(&query, &[]).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Core(CoreError::ArgumentCount {
            expected: 1,
            got: 0
        })
    ));
}

#[tokio::test]
async fn test_compile_error_surfaces() {
    let db = database().await;
    let err = db.query::<Person>(col("email").eq(val("x"))).unwrap_err();
    assert!(matches!(err, Error::Core(CoreError::UnknownColumn { .. })));
    assert!(err.to_string().ends_with("email doesn't exist in person"));
}
