//! Test utilities for database operations.
//!
//! Connects to a disposable `PostgreSQL` database, runs migrations and
//! provides fixture builders for the enrolment tables.

use std::sync::Arc;

use chrono::Utc;
use enrol_common::IdGenerator;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Set,
    Statement,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::entities::enrol_instance::InstanceStatus;
use crate::entities::{course, enrol_instance, user};
use crate::migrations::Migrator;

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "enrol_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "enrol_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "enrol_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    /// Database connection, shareable with repositories.
    pub conn: Arc<DatabaseConnection>,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect with the default configuration and run migrations.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with a custom configuration and run migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Shared handle for building repositories.
    #[must_use]
    pub fn shared(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Truncate every table except the migration ledger.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let tables = self
            .conn
            .query_all(Statement::from_string(
                DatabaseBackend::Postgres,
                "SELECT tablename FROM pg_tables WHERE schemaname = 'public'".to_string(),
            ))
            .await?;

        for row in tables {
            if let Ok(table_name) = row.try_get::<String>("", "tablename") {
                if table_name == "seaql_migrations" {
                    continue;
                }

                let truncate = format!("TRUNCATE TABLE \"{table_name}\" CASCADE");
                self.conn
                    .execute(Statement::from_string(DatabaseBackend::Postgres, truncate))
                    .await?;
            }
        }

        info!("Cleaned up test database");
        Ok(())
    }

    /// Insert a user with a fresh bearer token.
    pub async fn insert_user(&self, username: &str) -> Result<user::Model, DbErr> {
        let id_gen = IdGenerator::new();
        user::ActiveModel {
            id: Set(id_gen.generate()),
            username: Set(username.to_string()),
            first_name: Set(username.to_string()),
            last_name: Set("Test".to_string()),
            token: Set(Some(id_gen.generate_token())),
            is_admin: Set(false),
            is_suspended: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(self.connection())
        .await
    }

    /// Insert a visible course.
    pub async fn insert_course(&self, short_name: &str) -> Result<course::Model, DbErr> {
        course::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            short_name: Set(short_name.to_string()),
            full_name: Set(format!("{short_name} (full)")),
            visible: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(self.connection())
        .await
    }

    /// Insert an enabled instance of `method` on a course.
    pub async fn insert_instance(
        &self,
        course_id: &str,
        method: &str,
        password: Option<&str>,
    ) -> Result<enrol_instance::Model, DbErr> {
        enrol_instance::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            course_id: Set(course_id.to_string()),
            method: Set(method.to_string()),
            name: Set(None),
            status: Set(InstanceStatus::Enabled),
            password: Set(password.map(str::to_string)),
            use_group_key: Set(false),
            show_hint: Set(None),
            enrol_start: Set(None),
            enrol_end: Set(None),
            max_enrolled: Set(0),
            allow_new_enrols: Set(true),
            sort_order: Set(0),
            created_at: Set(Utc::now()),
        }
        .insert(self.connection())
        .await
    }
}
