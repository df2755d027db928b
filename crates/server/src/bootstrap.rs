use std::sync::Arc;

use hrdesk_agent::OperationExecutor;
use hrdesk_core::config::{AppConfig, ConfigError};
use hrdesk_db::{connect_with_settings, migrations, DbPool, SqlEmployeeRepository};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub executor: OperationExecutor,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let executor = OperationExecutor::with_account_domain(
        Arc::new(SqlEmployeeRepository::new(db_pool.clone())),
        config.directory.account_domain.clone(),
    );

    Ok(Application { config, db_pool, executor })
}

#[cfg(test)]
mod tests {
    use hrdesk_agent::{Operation, Outcome};
    use hrdesk_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use hrdesk_core::domain::employee::NewEmployee;

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?).await
    }

    fn overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                account_domain: Some("corp.example".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_rejects_non_sqlite_database_url() {
        let result = bootstrap(overrides("postgres://localhost/hr")).await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("database.url"), "{message}");
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_wires_the_configured_account_domain() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("hrdesk.db").display());

        let app = bootstrap(overrides(&url)).await.expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'employee'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("employee table should exist after bootstrap");
        assert_eq!(table_count, 1);

        let outcome = app
            .executor
            .execute(Operation::CreateEmployee(NewEmployee::new("Mia", "技术部")))
            .await
            .expect("create");
        let Outcome::Created(employee) = outcome else { panic!("expected created, got {outcome:?}") };
        assert_eq!(employee.code.as_str(), "EMP001");
        assert_eq!(employee.account, "mia@corp.example");

        app.db_pool.close().await;
    }
}
