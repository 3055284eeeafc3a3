pub mod schema;
pub mod connection;
pub mod columns;
pub mod repositories;
pub mod toggle;

pub use connection::{Database, DbConnection, DbPool};
pub use toggle::{insert_if_absent, InsertOutcome};
