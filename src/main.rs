use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use registry_appwrite::{AppwriteClient, AppwriteConfig};
use registry_core::constants::LOCAL_ENDPOINT;
use registry_core::memory::{MemoryDocumentStore, MemoryIdentityService, MemoryRecordStore};
use registry_core::{BackendKind, PatientRegistry, RegistryConfig};

/// Main entry point for the patient registry
///
/// Resolves configuration from the environment once, builds the registry over the selected
/// backend and serves the REST API.
///
/// # Environment Variables
/// - `REGISTRY_BACKEND`: `appwrite` (default) or `memory`
/// - `REGISTRY_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `REGISTRY_API_KEY`: API key callers must send in `x-api-key`
/// - `APPWRITE_ENDPOINT`, `APPWRITE_PROJECT_ID`, `APPWRITE_API_KEY`, `APPWRITE_DATABASE_ID`,
///   `APPWRITE_PATIENT_COLLECTION_ID`, `APPWRITE_BUCKET_ID`: backend settings
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("registry=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr: SocketAddr = std::env::var("REGISTRY_REST_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".into())
        .parse()?;
    let api_key = required("REGISTRY_API_KEY")?;
    let backend = registry_core::config::backend_kind_from_env_value(
        std::env::var("REGISTRY_BACKEND").ok(),
    )?;

    let registry = build_registry(backend)?;
    let app = api_rest::router(AppState::new(registry, api_key));

    tracing::info!("++ Starting patient registry REST on {} ({:?} backend)", rest_addr, backend);

    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_registry(backend: BackendKind) -> anyhow::Result<PatientRegistry> {
    let endpoint = match backend {
        BackendKind::Appwrite => required("APPWRITE_ENDPOINT")?,
        BackendKind::Memory => {
            std::env::var("APPWRITE_ENDPOINT").unwrap_or_else(|_| LOCAL_ENDPOINT.into())
        }
    };
    let cfg = Arc::new(RegistryConfig::new(
        &endpoint,
        &required("APPWRITE_PROJECT_ID")?,
        &required("APPWRITE_DATABASE_ID")?,
        &required("APPWRITE_PATIENT_COLLECTION_ID")?,
        &required("APPWRITE_BUCKET_ID")?,
    )?);

    let registry = match backend {
        BackendKind::Appwrite => {
            let appwrite_cfg = AppwriteConfig::for_registry(&cfg, required("APPWRITE_API_KEY")?)?;
            let client = Arc::new(AppwriteClient::new(&appwrite_cfg)?);
            PatientRegistry::new(cfg, client.clone(), client.clone(), client)
        }
        BackendKind::Memory => {
            tracing::warn!("using in-memory backend; data is lost on exit");
            let records = MemoryRecordStore::new().with_unique_attribute(
                cfg.patient_collection_id().as_str(),
                registry_core::constants::USER_ID_ATTRIBUTE,
            );
            PatientRegistry::new(
                cfg,
                Arc::new(MemoryIdentityService::new()),
                Arc::new(MemoryDocumentStore::new()),
                Arc::new(records),
            )
        }
    };

    Ok(registry)
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow::anyhow!("{} must be set", name))
}
