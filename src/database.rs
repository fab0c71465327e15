//! Database initialization and table definitions
//!
//! The embedded redb file plays the role of a local key-value medium: a
//! single string table holding a handful of whole JSON blobs.

use redb::{Database, TableDefinition};
use std::path::Path;

/// Key-value table holding whole JSON blobs
///
/// Key: blob name (see [`URLS_KEY`], [`ANALYTICS_KEY`])
/// Value: JSON document as string
///
/// Example:
/// - Key: "shortened_urls"
/// - Value: '[{"id":"1705501234567890","originalUrl":"https://example.com",...}]'
pub const TABLE_STORAGE: TableDefinition<&str, &str> = TableDefinition::new("local_storage_v1");

/// Blob holding the JSON array of URL records, in insertion order
pub const URLS_KEY: &str = "shortened_urls";

/// Blob holding the JSON object mapping shortcode to its click records
pub const ANALYTICS_KEY: &str = "url_analytics";

/// Initializes the embedded database and creates the storage table
///
/// # Arguments
///
/// * `db_path` - File path where the database should be stored (e.g., "data.db")
///
/// # Example
///
/// ```no_run
/// # use snaplink::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: impl AsRef<Path>) -> Result<Database, redb::Error> {
    tracing::info!("Opening database at: {:?}", db_path.as_ref());

    let db = Database::create(db_path)?;

    // Open (or create if not exists) the table so readers never see it missing
    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_STORAGE)?;
    }
    write_txn.commit()?;

    Ok(db)
}
