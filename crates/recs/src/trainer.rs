//! Offline training pipeline.
//!
//! Runs the full batch: read inputs, extract interactions, build the
//! centered matrix, fit the similarity index, and replace the artifact
//! bundle. The whole model is rebuilt from scratch on every run; there is
//! no incremental path.

use crate::error::{RecsError, Result};
use crate::extract::{
    extract_app_interactions, read_catalogs, read_external_ratings, read_library_records,
    unify_interactions,
};
use crate::index::CosineIndex;
use crate::matrix::MatrixBuilder;
use crate::store::{ArtifactStore, Manifest};
use bookshelf_core::config::{ArtifactConfig, TrainingConfig};
use std::path::PathBuf;
use tracing::info;

/// Inputs and parameters of one training run.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    /// Catalog CSVs, base first; earlier files win on duplicate ISBNs
    pub catalogs: Vec<PathBuf>,
    /// Bulk external ratings CSV
    pub ratings: PathBuf,
    /// Optional library-records JSON export from the application
    pub library: Option<PathBuf>,
    pub training: TrainingConfig,
    pub artifacts: ArtifactConfig,
}

/// Execute a training run end to end and return the manifest of the
/// replaced bundle.
pub fn run(run: &TrainingRun) -> Result<Manifest> {
    let catalog = read_catalogs(&run.catalogs)?;
    if catalog.is_empty() {
        return Err(RecsError::DataInsufficient(
            "catalog contains no usable books".to_string(),
        ));
    }
    info!(books = catalog.len(), "catalog merged");

    let external = read_external_ratings(&run.ratings)?;

    let app = match &run.library {
        Some(path) => {
            let records = read_library_records(path)?;
            let interactions = extract_app_interactions(&records);
            info!(
                records = records.len(),
                interactions = interactions.len(),
                "extracted app interactions"
            );
            interactions
        }
        None => Vec::new(),
    };

    let interactions = unify_interactions(external, app);
    info!(interactions = interactions.len(), "unified interaction table");

    let builder = MatrixBuilder::new(
        run.training.min_user_ratings,
        run.training.min_item_ratings,
    );
    let built = builder.build(&interactions, &catalog)?;
    let index = CosineIndex::build(built.matrix.clone());

    let store = ArtifactStore::new(&run.artifacts.dir);
    let manifest = store.save(&built, &index)?;
    info!(
        model_version = manifest.model_version,
        n_items = manifest.n_items,
        n_users = manifest.n_users,
        "training run complete"
    );
    Ok(manifest)
}
