//! Connection pool, migrations and the single writer.

mod write_actor;

pub use write_actor::{spawn_writer, WriteHandle};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::errors::{IntoCore, StorageError};
use pennywise_core::errors::{DatabaseError, Error, Result};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

const POOL_MAX_SIZE: u32 = 8;
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct ConnectionCustomizer;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), r2d2::Error> {
        conn.batch_execute(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 30000; PRAGMA synchronous = NORMAL;",
        )
        .map_err(r2d2::Error::QueryError)
    }
}

/// Creates the database file and its parent directory if needed and switches
/// it to WAL mode. Returns the path that was initialized.
pub fn init(db_path: &str) -> Result<String> {
    let path = get_db_path(db_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let path = path.to_string_lossy().to_string();

    let mut conn = SqliteConnection::establish(&path).map_err(StorageError::from)?;
    conn.batch_execute("PRAGMA journal_mode = WAL;")
        .map_err(StorageError::from)?;
    log::info!("Database initialized at {}", path);
    Ok(path)
}

pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .max_size(POOL_MAX_SIZE)
        .min_idle(Some(1))
        .connection_timeout(POOL_CONNECTION_TIMEOUT)
        .connection_customizer(Box::new(ConnectionCustomizer))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::PoolCreationFailed(e.to_string())))?;
    Ok(Arc::new(pool))
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get().into_core()
}

/// Applies pending embedded migrations.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = get_connection(pool)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
    if applied.is_empty() {
        log::debug!("Database schema is up to date");
    }
    for version in applied {
        log::info!("Applied migration {}", version);
    }
    Ok(())
}

/// Resolves `db_path`, treating a directory as the location of `pennywise.db`.
pub fn get_db_path(db_path: &str) -> PathBuf {
    let path = Path::new(db_path);
    if path.is_dir() {
        path.join("pennywise.db")
    } else {
        path.to_path_buf()
    }
}

/// Initializes the file, builds the pool, migrates and starts the writer.
pub fn open(db_path: &str) -> Result<(Arc<DbPool>, WriteHandle)> {
    let path = init(db_path)?;
    let pool = create_pool(&path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());
    Ok((pool, writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_get_db_path_appends_file_name_for_directories() {
        let dir = tempdir().unwrap();
        let resolved = get_db_path(dir.path().to_str().unwrap());
        assert_eq!(resolved, dir.path().join("pennywise.db"));

        let file = dir.path().join("custom.db");
        assert_eq!(get_db_path(file.to_str().unwrap()), file);
    }

    #[test]
    fn test_init_creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested").join("rates.db");
        let path = init(nested.to_str().unwrap()).unwrap();
        assert!(Path::new(&path).exists());
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let dir = tempdir().unwrap();
        let path = init(dir.path().join("m.db").to_str().unwrap()).unwrap();
        let pool = create_pool(&path).unwrap();
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap();
    }

    #[tokio::test]
    async fn test_writer_rolls_back_failed_jobs() {
        use crate::schema::currencies::dsl::*;
        use diesel::prelude::*;

        let dir = tempdir().unwrap();
        let (pool, writer) = open(dir.path().join("w.db").to_str().unwrap()).unwrap();

        let result = writer
            .exec(|conn| -> Result<()> {
                diesel::sql_query(
                    "INSERT INTO currencies (code, name, base_currency, rate, updated_at) \
                     VALUES ('USD', 'Dollar', 'RUB', 0.01, '2024-01-01 00:00:00')",
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Err(Error::Unexpected("abort".to_string()))
            })
            .await;
        assert!(result.is_err());

        let mut conn = get_connection(&pool).unwrap();
        let count: i64 = currencies.count().get_result(&mut conn).unwrap();
        assert_eq!(count, 0);
    }
}
