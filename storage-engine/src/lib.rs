pub mod azure;
pub mod moka_cache;

pub use azure::AzureTableBackend;
pub use moka_cache::MokaCache;

use application::ports::Backend;
use shared::Result;
use shared::config::BackendConfig;
use std::sync::Arc;
use tracing::info;

/// Build the backend selected by configuration.
///
/// Construction is where credentials are checked: a malformed master key
/// fails here, before the server starts accepting requests.
pub fn build_backend(config: &BackendConfig) -> Result<Arc<dyn Backend>> {
    info!("Initializing {} backend", config.name());

    let backend: Arc<dyn Backend> = match config {
        BackendConfig::Memory {
            max_entries,
            default_ttl,
        } => Arc::new(MokaCache::new(*max_entries, *default_ttl)),
        BackendConfig::Azure(azure) => Arc::new(AzureTableBackend::new(azure)?),
    };
    Ok(backend)
}
