//! Service registrations shared by the server and the integration tests

use crate::config::AppConfig;
use crate::core::auth::{JwtTokenService, TelegramLoginVerifier};
use crate::core::services::{MyReservationService, MyUserService};
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::repositories::{
    DbReservationRepository, DbTableRepository, DbUserRepository,
};
use di::{Injectable, ServiceCollection, ServiceProvider, ValidationError, existing_as_self};

/// Builds the provider over an already opened database.
///
/// Configuration and connection are registered as existing singletons so
/// repositories and the auth gate can take them as `Ref<AppConfig>` and
/// `Ref<DatabaseConnection>`.
pub fn build_provider(
    config: AppConfig,
    database: DatabaseConnection,
) -> Result<ServiceProvider, ValidationError> {
    ServiceCollection::new()
        .add(existing_as_self(config))
        .add(existing_as_self(database))
        .add(DbTableRepository::singleton())
        .add(DbReservationRepository::singleton())
        .add(DbUserRepository::singleton())
        .add(TelegramLoginVerifier::singleton())
        .add(JwtTokenService::singleton())
        .add(MyReservationService::scoped())
        .add(MyUserService::scoped())
        .build_provider()
}
