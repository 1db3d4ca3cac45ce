//! Pooled SQLite connection

use crate::config::AppConfig;
use log::info;
use sqlx::SqlitePool;
use sqlx::migrate::MigrateError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

pub struct DatabaseConnection {
    connection: SqlitePool,
}

impl DatabaseConnection {
    /// Opens the pool described by the configuration, creating the database
    /// file if needed, and applies pending migrations.
    pub async fn connect(config: &AppConfig) -> Result<DatabaseConnection, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let connection = DatabaseConnection { connection: pool };
        connection.migrate().await?;
        info!("database ready at {}", config.database_url);

        Ok(connection)
    }

    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!().run(&self.connection).await
    }
}

impl From<SqlitePool> for DatabaseConnection {
    fn from(connection: SqlitePool) -> Self {
        DatabaseConnection { connection }
    }
}

impl Deref for DatabaseConnection {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl DerefMut for DatabaseConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.connection
    }
}
