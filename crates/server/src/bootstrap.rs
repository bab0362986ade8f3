use std::sync::Arc;
use std::time::Duration;

use procura_agent::{ExtractionBackend, ExtractionService, LlmError};
use procura_core::config::{AppConfig, ConfigError, LoadOptions};
use procura_core::directory::VendorDirectory;
use procura_core::errors::ApplicationError;
use procura_core::lifecycle::{LifecyclePorts, RfpLifecycleManager};
use procura_core::ports::{StructuredExtractor, TransportError};
use procura_db::{
    connect_with_settings, migrations, DbPool, SqlProposalRepository, SqlRfpRepository,
    SqlVendorRepository,
};
use thiserror::Error;
use tracing::info;

use crate::api::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
    pub extraction_backend: &'static str,
    pub mail_transport: &'static str,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("extraction backend failed to initialise: {0}")]
    Extraction(#[source] LlmError),
    #[error("mail transport failed to initialise: {0}")]
    Mail(#[source] TransportError),
    #[error("rfp lifecycle failed to initialise: {0}")]
    Lifecycle(#[source] ApplicationError),
}

/// Lifecycle manager and vendor directory over one pool, plus the labels of the
/// extraction backend and mail transport the configuration selected.
pub struct Collaborators {
    pub lifecycle: RfpLifecycleManager,
    pub directory: VendorDirectory,
    pub extractor: Arc<dyn StructuredExtractor>,
    pub extraction_backend: &'static str,
    pub mail_transport: &'static str,
}

/// Builds extraction, mail and storage collaborators from configuration. Shared by
/// the HTTP server and the CLI so both run the same lifecycle wiring.
pub fn wire_collaborators(
    config: &AppConfig,
    db_pool: &DbPool,
) -> Result<Collaborators, BootstrapError> {
    let backend = ExtractionBackend::from_config(&config.llm).map_err(BootstrapError::Extraction)?;
    let extraction_backend = backend.label();
    let extractor: Arc<dyn StructuredExtractor> = Arc::new(ExtractionService::new(
        backend,
        Duration::from_secs(config.llm.timeout_secs),
    ));

    let (mail, mail_transport) =
        procura_mail::transport_from_config(&config.mail).map_err(BootstrapError::Mail)?;

    let vendors = Arc::new(SqlVendorRepository::new(db_pool.clone()));
    let lifecycle = RfpLifecycleManager::new(LifecyclePorts {
        rfps: Arc::new(SqlRfpRepository::new(db_pool.clone())),
        vendors: vendors.clone(),
        proposals: Arc::new(SqlProposalRepository::new(db_pool.clone())),
        mail,
        extractor: extractor.clone(),
    })
    .map_err(BootstrapError::Lifecycle)?;

    Ok(Collaborators {
        lifecycle,
        directory: VendorDirectory::new(vendors),
        extractor,
        extraction_backend,
        mail_transport,
    })
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Wires storage, extraction and mail behind the lifecycle manager.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let Collaborators { lifecycle, directory, extractor, extraction_backend, mail_transport } =
        wire_collaborators(&config, &db_pool)?;
    info!(
        event_name = "system.bootstrap.collaborators_ready",
        extraction_backend,
        mail_transport,
        "extraction backend and mail transport selected"
    );

    let state = AppState { lifecycle, directory, extractor };

    Ok(Application { config, db_pool, state, extraction_backend, mail_transport })
}
