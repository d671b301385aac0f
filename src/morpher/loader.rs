//! Asynchronous parameter loading.

use std::sync::{Arc, OnceLock};

use tokio::task::JoinSet;
use tracing::{info, warn};

use super::source::ParameterSource;
use crate::config::MorpherConfig;
use crate::params::{load_manifest, BlobRole, ParameterStore};
use crate::{Error, Result};

/// Progress of the background loader
#[derive(Debug, Clone)]
pub enum LoadStatus {
    /// Manifest or blobs still in flight
    Pending,
    /// Every blob deserialized
    Ready,
    /// A load failed; the decoder will never become ready
    Failed(Error),
}

impl LoadStatus {
    /// Whether loading has finished, successfully or not
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Fetch the manifest, then every weight and bias blob concurrently.
///
/// The store is published into `cell` as soon as the manifest is parsed so
/// progress can be observed while blobs are in flight. A failed blob does not
/// cancel the others; the first error is returned once all have settled.
pub(crate) async fn load_parameters<S: ParameterSource>(
    source: Arc<S>,
    config: MorpherConfig,
    cell: Arc<OnceLock<Arc<ParameterStore>>>,
) -> Result<()> {
    let naming = &config.naming;
    let manifest = source.fetch(&naming.manifest).await?;
    let sizes = load_manifest(&manifest)?;
    sizes.check_against(&config)?;
    info!(
        manifest = %naming.manifest,
        sizes = ?sizes.sizes(),
        blobs = sizes.expected_blob_count(),
        "loaded size manifest"
    );

    let store = Arc::clone(cell.get_or_init(|| Arc::new(ParameterStore::new(sizes))));

    let mut tasks = JoinSet::new();
    for layer in 0..store.sizes().layer_count() {
        for role in [BlobRole::Weight, BlobRole::Bias] {
            let name = match role {
                BlobRole::Weight => naming.weight(layer),
                BlobRole::Bias => naming.bias(layer),
            };
            let source = Arc::clone(&source);
            let store = Arc::clone(&store);
            tasks.spawn(async move {
                let bytes = source.fetch(&name).await?;
                let loaded = store.load_blob(layer, role, &name, &bytes)?;
                info!(blob = %name, loaded, expected = store.expected_count(), "done loading");
                Ok::<_, Error>(())
            });
        }
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined
            .map_err(|e| Error::load("parameter blob", format!("load task failed: {e}")))
            .and_then(|r| r);
        if let Err(e) = outcome {
            warn!(error = %e, "parameter blob failed to load");
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
