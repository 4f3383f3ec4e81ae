//! SQLite persistence for the message registry
//!
//! Persistence is optional: without `--database` the registry lives in
//! memory and is lost on restart.

mod messages;
mod sql;

pub use messages::MessageDb;

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Maximum pooled connections
const MAX_CONNECTIONS: u32 = 4;

/// Open (creating if necessary) the database at `path` and run migrations
pub async fn init_db(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
