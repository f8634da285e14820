//! Test utilities for database operations.
//!
//! Tests run against an in-memory SQLite database with every migration
//! applied. The pool holds exactly one connection: each `sqlite::memory:`
//! connection is its own database, so a larger pool would scatter rows
//! across unrelated databases.
//!
//! [`TestDatabase::pooled`] opens a real multi-connection pool for tests
//! that race writers against each other. It uses a temporary SQLite file,
//! or the Postgres database named by `AGORA_TEST_DATABASE_URL` when set.

use std::path::PathBuf;
use std::sync::Arc;

use agora_common::IdGenerator;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// A migrated, throwaway database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
    file: Option<PathBuf>,
}

impl TestDatabase {
    /// Open a fresh in-memory database and run all migrations.
    pub async fn new() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        info!("Created in-memory test database");

        Ok(Self {
            conn: Arc::new(conn),
            file: None,
        })
    }

    /// Open a migrated database behind a pool of `max_connections`.
    pub async fn pooled(max_connections: u32) -> Result<Self, DbErr> {
        let (url, file) = match std::env::var("AGORA_TEST_DATABASE_URL") {
            Ok(url) => (url, None),
            Err(_) => {
                let path = std::env::temp_dir()
                    .join(format!("agora-test-{}.db", IdGenerator::new().generate()));
                (format!("sqlite://{}?mode=rwc", path.display()), Some(path))
            }
        };

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(max_connections)
            .min_connections(1)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        info!(max_connections, backend = ?conn.get_database_backend(), "Created pooled test database");

        Ok(Self {
            conn: Arc::new(conn),
            file,
        })
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Get a shared handle to the connection, as repositories expect.
    #[must_use]
    pub fn shared(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Run raw SQL, e.g. to install a failure-injecting trigger.
    pub async fn execute_raw(&self, sql: &str) -> Result<(), DbErr> {
        self.conn.execute_unprepared(sql).await.map(|_| ())
    }

    /// Count rows in a table.
    pub async fn count(&self, table: &str) -> Result<i64, DbErr> {
        let row = self
            .conn
            .query_one(sea_orm::Statement::from_string(
                self.conn.get_database_backend(),
                format!("SELECT COUNT(*) AS n FROM \"{table}\""),
            ))
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(table.to_string()))?;

        row.try_get::<i64>("", "n")
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Some(path) = &self.file {
            for suffix in ["", "-wal", "-shm"] {
                let mut name = path.clone().into_os_string();
                name.push(suffix);
                let _ = std::fs::remove_file(name);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_create_every_table() {
        let db = TestDatabase::new().await.unwrap();

        for table in [
            "user",
            "post",
            "comment",
            "job",
            "application",
            "connection",
            "conversation",
            "message",
        ] {
            assert_eq!(db.count(table).await.unwrap(), 0, "table {table}");
        }
    }

    #[tokio::test]
    async fn test_pooled_database_is_migrated_and_removed_on_drop() {
        let db = TestDatabase::pooled(4).await.unwrap();
        assert!(db.count("user").await.unwrap() >= 0);

        let file = db.file.clone();
        drop(db);
        if let Some(path) = file {
            assert!(!path.exists());
        }
    }
}
