//! Database module for PostgreSQL persistence.

mod contacts;

pub use contacts::*;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Type alias for the database pool.
pub type Pool = PgPool;

const MAX_CONNECTIONS: u32 = 10;

/// Create a new database connection pool.
pub async fn create_pool(database_url: &str) -> Result<Pool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

/// Run database migrations.
pub async fn run_migrations(pool: &Pool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Name of the constraint enforcing phone uniqueness.
pub const PHONE_KEY_CONSTRAINT: &str = "contacts_phone_key_unique";

/// Whether `e` is a unique violation, optionally on a specific constraint.
pub fn is_unique_violation(e: &sqlx::Error, constraint: Option<&str>) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        // PostgreSQL unique violation code is "23505"
        let unique = db_err.code().map(|c| c == "23505").unwrap_or(false);
        unique
            && match constraint {
                Some(name) => db_err.constraint() == Some(name),
                None => true,
            }
    } else {
        false
    }
}
