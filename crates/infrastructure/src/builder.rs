use std::sync::Arc;

use config::{StorageBackend, StorageConfig};
use domain::ObjectStoreError;
use thiserror::Error;

use crate::{object_store::LocalObjectStore, signing::UrlSigner};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] ObjectStoreError),
}

#[derive(Clone)]
pub struct Infrastructure {
    pub object_store: Arc<LocalObjectStore>,
}

impl Infrastructure {
    pub async fn build(config: &StorageConfig) -> Result<Self, InfrastructureError> {
        let signer = UrlSigner::new(
            config.signing_secret.as_bytes(),
            config.public_base_url.clone(),
        );

        let object_store = match config.backend {
            StorageBackend::Memory => LocalObjectStore::in_memory(signer, config.url_ttl()),
            StorageBackend::Filesystem => {
                LocalObjectStore::filesystem(config.root_dir.clone(), signer).await?
            }
        };

        Ok(Self {
            object_store: Arc::new(object_store),
        })
    }
}
