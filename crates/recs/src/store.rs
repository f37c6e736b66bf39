//! Artifact bundle persistence.
//!
//! A training run persists four artifacts — the similarity index, the
//! item↔row mapping, the row-aligned metadata table, and the centered
//! matrix — plus a JSON manifest, using bincode for the binary files.
//!
//! Every file is written to a temp path and renamed into place, and all
//! files of one run share a model version stamp that the loader checks, so
//! an in-flight query never observes a half-written or torn bundle.
//! Concurrent trainings against the same directory are not supported.

use crate::error::{RecsError, Result};
use crate::index::CosineIndex;
use crate::matrix::{ItemMapping, RatingMatrix};
use crate::sparse::CsrMatrix;
use bookshelf_core::models::Book;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const INDEX_FILE: &str = "index.bin";
pub const MAPPINGS_FILE: &str = "mappings.bin";
pub const BOOKS_FILE: &str = "books.bin";
pub const MATRIX_FILE: &str = "matrix.bin";
pub const MANIFEST_FILE: &str = "manifest.json";

const FORMAT_VERSION: u32 = 1;

/// Summary of a persisted bundle, written last so readers can treat its
/// presence as the commit point of a training run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    /// Stamp shared by every file of one training run
    pub model_version: i64,
    pub created_at: DateTime<Utc>,
    pub n_items: usize,
    pub n_users: usize,
    /// Stored entries in the centered matrix
    pub nnz: usize,
}

#[derive(Serialize)]
struct VersionedRef<'a, T: Serialize> {
    model_version: i64,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Versioned<T> {
    model_version: i64,
    payload: T,
}

/// The in-memory artifact bundle the query path works against. Read-only
/// once loaded; reloads swap the whole value (see
/// [`ModelHandle`](crate::handle::ModelHandle)).
#[derive(Debug, Clone)]
pub struct RecommenderModel {
    pub manifest: Manifest,
    pub index: CosineIndex,
    /// Centered matrix the per-item query vectors are derived from
    pub matrix: CsrMatrix,
    pub mapping: ItemMapping,
    pub books: Vec<Book>,
}

/// Reads and writes artifact bundles under a fixed directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a trained model, replacing any previous bundle.
    pub fn save(&self, built: &RatingMatrix, index: &CosineIndex) -> Result<Manifest> {
        fs::create_dir_all(&self.dir)?;

        let created_at = Utc::now();
        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            model_version: created_at.timestamp_millis(),
            created_at,
            n_items: built.mapping.len(),
            n_users: built.n_users,
            nnz: built.matrix.nnz(),
        };

        self.write_artifact(INDEX_FILE, manifest.model_version, index)?;
        self.write_artifact(MAPPINGS_FILE, manifest.model_version, &built.mapping)?;
        self.write_artifact(BOOKS_FILE, manifest.model_version, &built.books)?;
        self.write_artifact(MATRIX_FILE, manifest.model_version, &built.matrix)?;

        // Manifest last: it commits the bundle.
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| RecsError::ArtifactCorrupt(format!("manifest encode: {e}")))?;
        self.write_atomic(MANIFEST_FILE, &manifest_bytes)?;

        info!(
            dir = %self.dir.display(),
            model_version = manifest.model_version,
            n_items = manifest.n_items,
            n_users = manifest.n_users,
            "artifact bundle replaced"
        );
        Ok(manifest)
    }

    /// Load the current bundle.
    ///
    /// # Errors
    ///
    /// [`RecsError::ArtifactMissing`] when no manifest exists;
    /// [`RecsError::ArtifactCorrupt`] when any file fails to decode, the
    /// version stamps disagree, or row alignment across artifacts is broken.
    pub fn load(&self) -> Result<RecommenderModel> {
        let manifest = self.manifest()?;

        let index: CosineIndex = self.read_artifact(INDEX_FILE, manifest.model_version)?;
        let mapping: ItemMapping = self.read_artifact(MAPPINGS_FILE, manifest.model_version)?;
        let books: Vec<Book> = self.read_artifact(BOOKS_FILE, manifest.model_version)?;
        let matrix: CsrMatrix = self.read_artifact(MATRIX_FILE, manifest.model_version)?;

        let aligned = index.len() == manifest.n_items
            && mapping.len() == manifest.n_items
            && books.len() == manifest.n_items
            && matrix.n_rows() == manifest.n_items;
        if !aligned {
            return Err(RecsError::ArtifactCorrupt(format!(
                "row alignment broken: manifest says {} items, index {} / mapping {} / \
                 books {} / matrix {}",
                manifest.n_items,
                index.len(),
                mapping.len(),
                books.len(),
                matrix.n_rows()
            )));
        }

        Ok(RecommenderModel {
            manifest,
            index,
            matrix,
            mapping,
            books,
        })
    }

    /// Read just the manifest of the current bundle.
    pub fn manifest(&self) -> Result<Manifest> {
        let path = self.dir.join(MANIFEST_FILE);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RecsError::ArtifactMissing {
                    path: self.dir.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let manifest: Manifest = serde_json::from_slice(&bytes)
            .map_err(|e| RecsError::ArtifactCorrupt(format!("{MANIFEST_FILE}: {e}")))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(RecsError::ArtifactCorrupt(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                manifest.format_version
            )));
        }
        Ok(manifest)
    }

    fn write_artifact<T: Serialize>(&self, name: &str, version: i64, payload: &T) -> Result<()> {
        let bytes = bincode::serialize(&VersionedRef {
            model_version: version,
            payload,
        })
        .map_err(|e| RecsError::ArtifactCorrupt(format!("{name} encode: {e}")))?;
        self.write_atomic(name, &bytes)
    }

    fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let target = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn read_artifact<T: DeserializeOwned>(&self, name: &str, expected_version: i64) -> Result<T> {
        let path = self.dir.join(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RecsError::ArtifactCorrupt(format!("{name} is missing")))
            }
            Err(e) => return Err(e.into()),
        };
        let versioned: Versioned<T> = bincode::deserialize(&bytes)
            .map_err(|e| RecsError::ArtifactCorrupt(format!("{name}: {e}")))?;
        if versioned.model_version != expected_version {
            return Err(RecsError::ArtifactCorrupt(format!(
                "{name} is stamped {} but the manifest says {expected_version}; torn bundle",
                versioned.model_version
            )));
        }
        Ok(versioned.payload)
    }
}
