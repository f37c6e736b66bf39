//! End-to-end tests for the offline training pipeline: CSV + JSON inputs
//! through extraction, matrix build, indexing, persistence, and query.

use bookshelf_core::config::{ArtifactConfig, TrainingConfig};
use bookshelf_recs::trainer::{self, TrainingRun};
use bookshelf_recs::{ModelHandle, RecsError};
use std::fs;
use std::path::{Path, PathBuf};

fn write_fixture_inputs(dir: &Path) -> (Vec<PathBuf>, PathBuf, PathBuf) {
    let books = dir.join("Books.csv");
    fs::write(
        &books,
        "ISBN;Book-Title;Book-Author\n\
         0001;The First Garden;Iris Lane\n\
         0002;A Second Spring;Iris Lane\n\
         0003;Winter Notes;Tom Frost\n\
         0004;Harbor Lights;Mara Quinn\n\
         bad-row-without-enough-fields\n",
    )
    .unwrap();

    // Users A and B agree on 0001/0002 and dislike 0003; C is the
    // counter-signal; D only touches 0002/0004. 0004 ends up below the
    // item threshold and drops out of the model.
    let ratings = dir.join("Ratings.csv");
    fs::write(
        &ratings,
        "User-ID;ISBN;Book-Rating\n\
         A;0001;10\n\
         A;0002;10\n\
         A;0003;2\n\
         B;0001;9\n\
         B;0002;9\n\
         B;0003;1\n\
         C;0001;2\n\
         C;0003;10\n\
         D;0002;8\n\
         D;0004;8\n\
         D;;5\n\
         E;0001;0\n",
    )
    .unwrap();

    let library = dir.join("library.json");
    fs::write(
        &library,
        r#"[
            {"user_id": "9", "isbn": "0001", "status": "finished"},
            {"user_id": "9", "isbn": "0002", "status": "finished", "rating": 4.0},
            {"user_id": "9", "isbn": "0004", "status": "pending"}
        ]"#,
    )
    .unwrap();

    (vec![books], ratings, library)
}

fn fixture_run(dir: &Path) -> TrainingRun {
    let (catalogs, ratings, library) = write_fixture_inputs(dir);
    TrainingRun {
        catalogs,
        ratings,
        library: Some(library),
        training: TrainingConfig {
            min_user_ratings: 2,
            min_item_ratings: 2,
        },
        artifacts: ArtifactConfig {
            dir: dir.join("artifacts"),
        },
    }
}

#[test]
fn train_then_recommend() {
    let dir = tempfile::tempdir().unwrap();
    let run = fixture_run(dir.path());

    let manifest = trainer::run(&run).unwrap();
    // 0004 has one interaction (D); the pending record adds none.
    assert_eq!(manifest.n_items, 3);
    // A, B, C, D, app_9 all survive the user threshold.
    assert_eq!(manifest.n_users, 5);

    let handle = ModelHandle::load(&run.artifacts.dir).unwrap();
    let response = handle.recommend(&["0001".to_string()], 12, 30);
    let items = response.items();

    // 0002 co-varies with 0001 across A, B, and app_9; 0003 is
    // anti-correlated and must not appear with a negated score.
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].isbn, "0002");
    assert_eq!(items[0].title, "A Second Spring");
    assert_eq!(items[0].author, "Iris Lane");
    assert!(items[0].score > 0.0);
}

#[test]
fn held_items_never_recommended_back_whatever_their_state() {
    let dir = tempfile::tempdir().unwrap();
    let run = fixture_run(dir.path());
    trainer::run(&run).unwrap();

    let handle = ModelHandle::load(&run.artifacts.dir).unwrap();
    // The user's full library, including the pending 0004.
    let known = vec!["0001".to_string(), "0002".to_string(), "0004".to_string()];
    let response = handle.recommend(&known, 12, 30);
    for item in response.items() {
        assert!(!known.contains(&item.isbn), "{} was recommended back", item.isbn);
    }
}

#[test]
fn reload_after_retrain_yields_identical_output() {
    let dir = tempfile::tempdir().unwrap();
    let run = fixture_run(dir.path());
    trainer::run(&run).unwrap();

    let known = vec!["0001".to_string(), "0003".to_string()];

    let handle = ModelHandle::load(&run.artifacts.dir).unwrap();
    let before = handle.recommend(&known, 12, 30);

    // A second load of the same bundle and a reload must both reproduce the
    // output exactly: serialization is lossless.
    let second = ModelHandle::load(&run.artifacts.dir).unwrap();
    assert_eq!(second.recommend(&known, 12, 30), before);

    handle.reload().unwrap();
    assert_eq!(handle.recommend(&known, 12, 30), before);
}

#[test]
fn unknown_known_set_returns_no_signal() {
    let dir = tempfile::tempdir().unwrap();
    let run = fixture_run(dir.path());
    trainer::run(&run).unwrap();

    let handle = ModelHandle::load(&run.artifacts.dir).unwrap();
    let response = handle.recommend(&["9999".to_string()], 12, 30);
    assert!(response.is_no_signal());
    assert!(response.items().is_empty());
}

#[test]
fn insufficient_data_stops_the_run_without_touching_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let mut run = fixture_run(dir.path());
    run.training = TrainingConfig {
        min_user_ratings: 50,
        min_item_ratings: 50,
    };

    let err = trainer::run(&run).unwrap_err();
    assert!(matches!(err, RecsError::DataInsufficient(_)));
    assert!(!run.artifacts.dir.join("manifest.json").exists());

    // And the query path reports the bundle as missing, not corrupt.
    assert!(matches!(
        ModelHandle::load(&run.artifacts.dir),
        Err(RecsError::ArtifactMissing { .. })
    ));
}

#[test]
fn retrain_replaces_bundle_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let run = fixture_run(dir.path());

    let first = trainer::run(&run).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = trainer::run(&run).unwrap();
    assert!(second.model_version > first.model_version);

    let handle = ModelHandle::load(&run.artifacts.dir).unwrap();
    assert_eq!(handle.manifest().model_version, second.model_version);

    // No stray temp files from either run.
    for entry in fs::read_dir(&run.artifacts.dir).unwrap() {
        let path = entry.unwrap().path();
        assert!(
            path.extension().map_or(true, |ext| ext != "tmp"),
            "leftover temp file {}",
            path.display()
        );
    }
}
