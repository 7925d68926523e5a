//! Database layer: `SeaORM` entities, migrations, and the SQL-backed
//! persistence port.

pub mod entities;
pub mod migration;
pub mod store;

pub use migration::Migrator;
pub use store::SqlStore;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(max_connections)
        .min_connections(min_connections);
    Database::connect(options).await
}
