//! Pet registry demo.
//!
//! Creates the `person` and `dog` tables, stores a few rows and runs some
//! compiled queries against them.
//!
//! ```sh
//! cargo run -p sqlscope-sqlite --example pets -- --verbose
//! ```

use clap::Parser;
use sqlscope_core::{col, exists, filter, param, val, LazyQuery, Order, SqlValue};
use sqlscope_derive::Table;
use sqlscope_sqlite::{Database, DatabaseConfig};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Stores people and their dogs, then queries them.
#[derive(Parser)]
#[command(name = "pets")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite::memory:")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Table)]
struct Person {
    #[column(primary_key)]
    name: String,
    age: i64,
}

#[derive(Debug, Clone, Table)]
struct Dog {
    #[column(primary_key)]
    name: String,
    #[column(references = "person.name", cascade, index)]
    owner: String,
}

static ADULTS: LazyQuery<Person> = LazyQuery::new(|| col("age").ge(param::<i64>("min")));

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let db = Database::connect(&DatabaseConfig::new(cli.database)).await?;
    db.create_table::<Person>().await?;
    db.create_table::<Dog>().await?;

    for (name, age) in [("Jake", 31), ("Finn", 14), ("Marceline", 1003)] {
        db.upsert(&Person {
            name: String::from(name),
            age,
        })
        .await?;
    }
    for (name, owner) in [("Lady", "Jake"), ("Jake Jr", "Jake"), ("Schwabl", "Marceline")] {
        db.upsert(&Dog {
            name: String::from(name),
            owner: String::from(owner),
        })
        .await?;
    }

    let adults = ADULTS.get(db.registry())?.order_by([Order::asc("name")])?;
    for person in db.find_all(&adults, &[SqlValue::Int(18)]).await? {
        info!(name = %person.name, age = person.age, "Adult");
    }

    let dog_owners = db.query::<Person>(exists(filter::<Dog>(col("owner").eq(Person::name()))))?;
    info!(sql = %dog_owners.where_sql(), "Dog owners filter");
    for person in db.find_all(&dog_owners, &[]).await? {
        info!(name = %person.name, "Has a dog");
    }

    let jake = db.query::<Person>(col("name").eq(val("Jake")))?;
    let removed = db.delete(&jake, &[]).await?;
    let all_dogs = db.query::<Dog>(col("name").like(val("%")))?;
    info!(removed, "Deleted Jake and his dogs");
    for dog in db.find_all(&all_dogs, &[]).await? {
        info!(name = %dog.name, owner = %dog.owner, "Dog left");
    }

    Ok(())
}
