//! Throwaway Postgres databases for the ignored integration tests.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use crate::migrations::Migrator;

/// Where the test server lives, read from `TEST_DB_*`.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: env_or("TEST_DB_HOST", "localhost"),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: env_or("TEST_DB_USER", "fandom_test"),
            password: env_or("TEST_DB_PASSWORD", "fandom_test"),
            database: env_or("TEST_DB_NAME", "fandom_test"),
        }
    }
}

impl TestDbConfig {
    fn url_for(&self, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{database}",
            self.username, self.password, self.host, self.port
        )
    }

    #[must_use]
    pub fn database_url(&self) -> String {
        self.url_for(&self.database)
    }

    /// Maintenance database used to create and drop per-test databases.
    #[must_use]
    pub fn postgres_url(&self) -> String {
        self.url_for("postgres")
    }
}

/// A migrated database whose connection repositories can share.
pub struct TestDatabase {
    pub conn: Arc<DatabaseConnection>,
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to an existing database and migrate it.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");
        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Create and migrate a database with a random name, for parallel tests.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("fandom_test_{}", &suffix[..8]);

        let admin = Database::connect(&config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        admin.close().await?;

        Self::with_config(config).await
    }

    /// Drop the database, terminating any connections still held by repositories.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        match Arc::try_unwrap(self.conn) {
            Ok(conn) => conn.close().await?,
            Err(_) => warn!(database = %self.config.database, "Connection still shared, terminating backends"),
        }

        let admin = Database::connect(&self.config.postgres_url()).await?;
        let terminate = format!(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
            self.config.database
        );
        if let Err(e) = admin
            .execute(Statement::from_string(DatabaseBackend::Postgres, terminate))
            .await
        {
            warn!(error = %e, "Failed to terminate test database backends");
        }

        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", self.config.database),
            ))
            .await?;
        admin.close().await?;

        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = TestDbConfig {
            host: "db".to_string(),
            port: 5433,
            username: "user".to_string(),
            password: "pass".to_string(),
            database: "fandom_test_ab12".to_string(),
        };
        assert_eq!(
            config.database_url(),
            "postgres://user:pass@db:5433/fandom_test_ab12"
        );
        assert_eq!(config.postgres_url(), "postgres://user:pass@db:5433/postgres");
    }
}
