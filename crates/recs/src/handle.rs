//! Reloadable model handle.
//!
//! Queries run against an immutable, shared snapshot of the artifact
//! bundle. After a retrain, `reload` loads the new bundle off to the side
//! and swaps the shared reference; in-flight queries keep the snapshot they
//! started with and never observe a half-loaded model.

use crate::error::Result;
use crate::recommend::{recommend_for_user, RecommendationResponse};
use crate::store::{ArtifactStore, Manifest, RecommenderModel};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Versioned, hot-reloadable handle over the current [`RecommenderModel`].
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct ModelHandle {
    store: ArtifactStore,
    current: RwLock<Arc<RecommenderModel>>,
}

impl ModelHandle {
    /// Load the bundle under `dir` and wrap it in a handle.
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self> {
        let store = ArtifactStore::new(dir);
        let model = store.load()?;
        info!(
            model_version = model.manifest.model_version,
            n_items = model.manifest.n_items,
            "recommendation model loaded"
        );
        Ok(Self {
            store,
            current: RwLock::new(Arc::new(model)),
        })
    }

    /// The current model snapshot. Holders keep a consistent view even if a
    /// reload swaps the bundle underneath them.
    pub fn snapshot(&self) -> Arc<RecommenderModel> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Manifest of the currently served bundle.
    pub fn manifest(&self) -> Manifest {
        self.snapshot().manifest.clone()
    }

    /// Re-read the bundle from disk and swap it in. On failure the previous
    /// model stays in service.
    pub fn reload(&self) -> Result<Manifest> {
        let fresh = self.store.load()?;
        let manifest = fresh.manifest.clone();
        let fresh = Arc::new(fresh);
        match self.current.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        info!(
            model_version = manifest.model_version,
            "recommendation model reloaded"
        );
        Ok(manifest)
    }

    /// Convenience wrapper over [`recommend_for_user`] against the current
    /// snapshot.
    pub fn recommend(
        &self,
        known_isbns: &[String],
        top_n: usize,
        neighbor_breadth: usize,
    ) -> RecommendationResponse {
        recommend_for_user(&self.snapshot(), known_isbns, top_n, neighbor_breadth)
    }
}
