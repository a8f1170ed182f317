pub mod connection;
pub mod connections;
pub mod migrations;
pub mod profiles;

pub use connection::{DatabaseConfig, get_db_pool};
pub use connections::PgRelationshipStore;
pub use profiles::PgProfileDirectory;
