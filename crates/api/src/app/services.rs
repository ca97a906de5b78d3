use std::sync::Arc;

use stockroom_infra::config::StoreBackend;
use stockroom_infra::store::{CatalogStore, InMemoryCatalogStore};

/// Shared handles every handler receives through an `Extension`.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn CatalogStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Fresh, empty in-memory catalog.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCatalogStore::new()))
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }
}

/// Build services for the configured backend.
///
/// With `USE_PERSISTENT_STORES=true` the binary must be built with the
/// `postgres` feature; otherwise it falls back to memory and says so.
pub async fn build_services(backend: &StoreBackend) -> anyhow::Result<AppServices> {
    match backend {
        StoreBackend::InMemory => {
            tracing::info!("using in-memory catalog store");
            Ok(AppServices::in_memory())
        }
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres { database_url } => {
            use anyhow::Context;

            let store = stockroom_infra::store::PostgresCatalogStore::connect(database_url)
                .await
                .context("failed to connect to postgres catalog store")?;
            tracing::info!("using postgres catalog store");
            Ok(AppServices::new(Arc::new(store)))
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres { .. } => {
            tracing::warn!(
                "persistent stores requested but the postgres feature is disabled; using memory"
            );
            Ok(AppServices::in_memory())
        }
    }
}
