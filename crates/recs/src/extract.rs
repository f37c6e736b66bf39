//! Interaction extraction.
//!
//! Turns the bulk external rating dataset plus the application's exported
//! library records into one deduplicated long-form table of
//! (user, item, rating) triples on the external 1-10 scale.
//!
//! Bulk files are `;`-separated CSV, frequently latin-1 encoded and noisy.
//! Rows are read as raw bytes and decoded lossily; any row that fails to
//! parse, lacks an item identifier, or carries a non-positive rating is
//! skipped and counted, never fatal to the run.

use crate::error::{RecsError, Result};
use bookshelf_core::models::{Book, Interaction, LibraryRecord, Provenance};
use bookshelf_core::validation::{normalize_isbn, validate_journal_rating, validate_user_id};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// Explicit journal ratings (0-5) are rescaled onto the external dataset's
/// 1-10 scale.
const JOURNAL_SCALE_FACTOR: f32 = 2.0;
/// Floor for rescaled explicit ratings, so "rated but scored zero" still
/// counts as signal instead of being dropped.
const MIN_EXPLICIT_RATING: f32 = 1.0;
/// Namespace prefix separating app users from bulk dataset users.
const APP_USER_PREFIX: &str = "app_";

/// Merged book catalog keyed by ISBN. First occurrence of an ISBN wins, so
/// the base catalog takes precedence over supplemental ones.
#[derive(Debug, Clone, Default)]
pub struct BookCatalog {
    books: HashMap<String, Book>,
}

impl BookCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from in-memory books, keeping the first entry per ISBN.
    pub fn from_books(books: impl IntoIterator<Item = Book>) -> Self {
        let mut catalog = Self::new();
        for book in books {
            catalog.insert_first(book);
        }
        catalog
    }

    /// Insert unless the ISBN is already present. Returns whether the book
    /// was inserted.
    pub fn insert_first(&mut self, book: Book) -> bool {
        match self.books.entry(book.isbn.clone()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(book);
                true
            }
        }
    }

    pub fn get(&self, isbn: &str) -> Option<&Book> {
        self.books.get(isbn)
    }

    pub fn contains(&self, isbn: &str) -> bool {
        self.books.contains_key(isbn)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

fn semicolon_reader(path: &Path) -> Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| RecsError::MalformedInput(format!("{}: {e}", path.display())))
}

/// Locate a column by any of its candidate header names, case-insensitively.
fn find_column(headers: &csv::ByteRecord, candidates: &[&str]) -> Option<usize> {
    headers.iter().position(|raw| {
        let name = String::from_utf8_lossy(raw);
        let name = name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase();
        candidates.iter().any(|c| name == *c)
    })
}

fn field(record: &csv::ByteRecord, idx: usize) -> Option<String> {
    record.get(idx).map(|raw| String::from_utf8_lossy(raw).into_owned())
}

/// Read one or more catalog CSVs (`ISBN;Book-Title;Book-Author`, extra
/// columns ignored) into a merged [`BookCatalog`]. Earlier files win on
/// duplicate ISBNs.
pub fn read_catalogs(paths: &[impl AsRef<Path>]) -> Result<BookCatalog> {
    let mut catalog = BookCatalog::new();
    for path in paths {
        let path = path.as_ref();
        let mut reader = semicolon_reader(path)?;
        let headers = reader
            .byte_headers()
            .map_err(|e| RecsError::MalformedInput(format!("{}: {e}", path.display())))?
            .clone();

        let isbn_col = find_column(&headers, &["isbn"]);
        let title_col = find_column(&headers, &["book-title", "title"]);
        let author_col = find_column(&headers, &["book-author", "author"]);
        let (Some(isbn_col), Some(title_col), Some(author_col)) =
            (isbn_col, title_col, author_col)
        else {
            return Err(RecsError::MalformedInput(format!(
                "{}: missing ISBN/title/author columns",
                path.display()
            )));
        };

        let mut kept = 0usize;
        let mut skipped = 0usize;
        for record in reader.byte_records() {
            let Ok(record) = record else {
                skipped += 1;
                continue;
            };
            let isbn = field(&record, isbn_col).as_deref().and_then(normalize_isbn);
            let title = field(&record, title_col).map(|t| t.trim().to_string());
            let author = field(&record, author_col).map(|a| a.trim().to_string());
            match (isbn, title, author) {
                (Some(isbn), Some(title), Some(author))
                    if !title.is_empty() && !author.is_empty() =>
                {
                    if catalog.insert_first(Book::new(isbn, title, author)) {
                        kept += 1;
                    }
                }
                _ => skipped += 1,
            }
        }
        info!(
            path = %path.display(),
            kept,
            skipped,
            "loaded catalog file"
        );
    }
    Ok(catalog)
}

/// Read the bulk external rating dataset (`User-ID;ISBN;Book-Rating`).
/// Ratings must be positive to count as signal; zero means "no rating" in
/// the source dataset and is dropped here.
pub fn read_external_ratings(path: impl AsRef<Path>) -> Result<Vec<Interaction>> {
    let path = path.as_ref();
    let mut reader = semicolon_reader(path)?;
    let headers = reader
        .byte_headers()
        .map_err(|e| RecsError::MalformedInput(format!("{}: {e}", path.display())))?
        .clone();

    let user_col = find_column(&headers, &["user-id", "user_id", "user"]);
    let isbn_col = find_column(&headers, &["isbn"]);
    let rating_col = find_column(&headers, &["book-rating", "rating"]);
    let (Some(user_col), Some(isbn_col), Some(rating_col)) = (user_col, isbn_col, rating_col)
    else {
        return Err(RecsError::MalformedInput(format!(
            "{}: missing user/ISBN/rating columns",
            path.display()
        )));
    };

    let mut interactions = Vec::new();
    let mut skipped = 0usize;
    for record in reader.byte_records() {
        let Ok(record) = record else {
            skipped += 1;
            continue;
        };
        let user = field(&record, user_col).map(|u| u.trim().to_string());
        let isbn = field(&record, isbn_col).as_deref().and_then(normalize_isbn);
        let rating = field(&record, rating_col).and_then(|r| r.trim().parse::<f32>().ok());
        match (user, isbn, rating) {
            (Some(user), Some(isbn), Some(rating)) if !user.is_empty() && rating > 0.0 => {
                interactions.push(Interaction::new(
                    user,
                    isbn,
                    rating,
                    Provenance::ExternalDataset,
                ));
            }
            _ => skipped += 1,
        }
    }
    info!(
        path = %path.display(),
        kept = interactions.len(),
        skipped,
        "loaded external ratings"
    );
    Ok(interactions)
}

/// Read the application's library-records export (a JSON array of
/// [`LibraryRecord`]). The export is produced by the record-keeping layer
/// outside this repository.
pub fn read_library_records(path: impl AsRef<Path>) -> Result<Vec<LibraryRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    serde_json::from_reader(file)
        .map_err(|e| RecsError::MalformedInput(format!("{}: {e}", path.display())))
}

/// Turn app library records into rating triples.
///
/// Explicit journal ratings are rescaled onto the 1-10 scale and always take
/// precedence over state-inferred ratings for the same (user, item) pair.
/// `Pending` records carry no signal. App user ids are namespaced with
/// `app_` so they can never collide with bulk dataset user ids.
pub fn extract_app_interactions(records: &[LibraryRecord]) -> Vec<Interaction> {
    let mut interactions = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    // Explicit ratings first; they win over inferred ones.
    for record in records {
        let Some(score) = record.rating else { continue };
        let Some((user, isbn)) = app_record_key(record) else {
            continue;
        };
        if validate_journal_rating(score).is_err() {
            warn!(user = %record.user_id, isbn = %record.isbn, score, "skipping out-of-range journal rating");
            continue;
        }
        if !seen.insert((user.clone(), isbn.clone())) {
            continue;
        }
        let rating = (score * JOURNAL_SCALE_FACTOR).max(MIN_EXPLICIT_RATING);
        interactions.push(Interaction::new(
            user,
            isbn,
            rating,
            Provenance::ExplicitJournal,
        ));
    }

    // Fill the remaining pairs from reading state.
    for record in records {
        let Some(rating) = record.status.inferred_rating() else {
            continue;
        };
        let Some((user, isbn)) = app_record_key(record) else {
            continue;
        };
        if !seen.insert((user.clone(), isbn.clone())) {
            continue;
        }
        interactions.push(Interaction::new(
            user,
            isbn,
            rating,
            Provenance::InferredFromState,
        ));
    }

    interactions
}

fn app_record_key(record: &LibraryRecord) -> Option<(String, String)> {
    let isbn = normalize_isbn(&record.isbn)?;
    if validate_user_id(&record.user_id).is_err() {
        warn!(user = %record.user_id, "skipping library record with invalid user id");
        return None;
    }
    Some((format!("{APP_USER_PREFIX}{}", record.user_id), isbn))
}

/// Merge external and app-derived triples into the final deduplicated
/// interaction table. First occurrence of a (user, item) pair wins; external
/// rows come first, so bulk-dataset ratings take precedence on a collision.
pub fn unify_interactions(
    external: Vec<Interaction>,
    app: Vec<Interaction>,
) -> Vec<Interaction> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut unified = Vec::with_capacity(external.len() + app.len());
    for interaction in external.into_iter().chain(app) {
        let key = (interaction.user_id.clone(), interaction.isbn.clone());
        if seen.insert(key) {
            unified.push(interaction);
        }
    }
    unified
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::models::ReadingStatus;
    use std::io::Write;

    fn record(user: &str, isbn: &str, status: ReadingStatus, rating: Option<f32>) -> LibraryRecord {
        LibraryRecord {
            user_id: user.to_string(),
            isbn: isbn.to_string(),
            status,
            rating,
        }
    }

    #[test]
    fn test_explicit_rating_rescaled_and_clamped() {
        let records = vec![
            record("1", "aaa", ReadingStatus::Finished, Some(4.0)),
            record("1", "bbb", ReadingStatus::Finished, Some(0.0)),
        ];
        let interactions = extract_app_interactions(&records);
        assert_eq!(interactions.len(), 2);
        assert_eq!(interactions[0].rating, 8.0);
        assert_eq!(interactions[0].provenance, Provenance::ExplicitJournal);
        // Scored zero is clamped up, not dropped.
        assert_eq!(interactions[1].rating, 1.0);
    }

    #[test]
    fn test_explicit_wins_over_inferred_for_same_pair() {
        let records = vec![
            record("1", "aaa", ReadingStatus::Abandoned, Some(5.0)),
            record("2", "aaa", ReadingStatus::Finished, None),
        ];
        let interactions = extract_app_interactions(&records);
        assert_eq!(interactions.len(), 2);

        let u1: Vec<_> = interactions.iter().filter(|i| i.user_id == "app_1").collect();
        assert_eq!(u1.len(), 1);
        assert_eq!(u1[0].rating, 10.0);
        assert_eq!(u1[0].provenance, Provenance::ExplicitJournal);

        let u2: Vec<_> = interactions.iter().filter(|i| i.user_id == "app_2").collect();
        assert_eq!(u2[0].rating, 9.0);
        assert_eq!(u2[0].provenance, Provenance::InferredFromState);
    }

    #[test]
    fn test_pending_carries_no_signal() {
        let records = vec![record("1", "aaa", ReadingStatus::Pending, None)];
        assert!(extract_app_interactions(&records).is_empty());
    }

    #[test]
    fn test_records_without_isbn_discarded() {
        let records = vec![
            record("1", "  ", ReadingStatus::Finished, Some(5.0)),
            record("1", "", ReadingStatus::Finished, None),
        ];
        assert!(extract_app_interactions(&records).is_empty());
    }

    #[test]
    fn test_out_of_range_journal_rating_falls_back_to_state() {
        let records = vec![record("1", "aaa", ReadingStatus::Finished, Some(11.0))];
        let interactions = extract_app_interactions(&records);
        assert_eq!(interactions.len(), 1);
        assert_eq!(interactions[0].rating, 9.0);
        assert_eq!(interactions[0].provenance, Provenance::InferredFromState);
    }

    #[test]
    fn test_unify_keeps_first_occurrence() {
        let external = vec![Interaction::new(
            "app_1",
            "aaa",
            7.0,
            Provenance::ExternalDataset,
        )];
        let app = vec![
            Interaction::new("app_1", "aaa", 2.0, Provenance::ExplicitJournal),
            Interaction::new("app_1", "bbb", 9.0, Provenance::InferredFromState),
        ];
        let unified = unify_interactions(external, app);
        assert_eq!(unified.len(), 2);
        assert_eq!(unified[0].rating, 7.0);
        assert_eq!(unified[0].provenance, Provenance::ExternalDataset);
        assert_eq!(unified[1].isbn, "bbb");
    }

    #[test]
    fn test_read_catalogs_skips_malformed_and_dedups() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // Latin-1 bytes in the author field (0xE9 = é) and assorted bad rows.
        file.write_all(b"ISBN;Book-Title;Book-Author\n").unwrap();
        file.write_all(b"0001;First Book;Ana P\xE9rez\n").unwrap();
        file.write_all(b";No Isbn;Somebody\n").unwrap();
        file.write_all(b"0002;;Missing Title\n").unwrap();
        file.write_all(b"0001;Duplicate;Other\n").unwrap();
        file.write_all(b"0003;Third Book;Writer\n").unwrap();
        file.flush().unwrap();

        let catalog = read_catalogs(&[file.path()]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("0001").unwrap().title, "First Book");
        assert_eq!(catalog.get("0001").unwrap().author, "Ana P\u{e9}rez");
        assert!(catalog.contains("0003"));
        assert!(!catalog.contains("0002"));
    }

    #[test]
    fn test_supplemental_catalog_base_wins() {
        let mut base = tempfile::NamedTempFile::new().unwrap();
        base.write_all(b"ISBN;Book-Title;Book-Author\n0001;Base Title;Base Author\n")
            .unwrap();
        base.flush().unwrap();

        let mut extra = tempfile::NamedTempFile::new().unwrap();
        extra
            .write_all(b"ISBN;Book-Title;Book-Author\n0001;Extra Title;Extra Author\n0002;Only Extra;Author\n")
            .unwrap();
        extra.flush().unwrap();

        let catalog = read_catalogs(&[base.path(), extra.path()]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("0001").unwrap().title, "Base Title");
        assert_eq!(catalog.get("0002").unwrap().title, "Only Extra");
    }

    #[test]
    fn test_read_external_ratings_filters_and_skips() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"User-ID;ISBN;Book-Rating\n").unwrap();
        file.write_all(b"276725;034545104X;0\n").unwrap(); // zero = no signal
        file.write_all(b"276726;0155061224;5\n").unwrap();
        file.write_all(b"276727;;8\n").unwrap(); // no isbn
        file.write_all(b"276728;0446520802;not-a-number\n").unwrap();
        file.write_all(b"276729;052165615X;3\n").unwrap();
        file.flush().unwrap();

        let interactions = read_external_ratings(file.path()).unwrap();
        assert_eq!(interactions.len(), 2);
        assert_eq!(interactions[0].user_id, "276726");
        assert_eq!(interactions[0].rating, 5.0);
        assert!(interactions
            .iter()
            .all(|i| i.provenance == Provenance::ExternalDataset));
    }

    #[test]
    fn test_missing_columns_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Foo;Bar\n1;2\n").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            read_external_ratings(file.path()),
            Err(RecsError::MalformedInput(_))
        ));
        assert!(matches!(
            read_catalogs(&[file.path()]),
            Err(RecsError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_read_library_records_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"[
                {"user_id": "7", "isbn": "0001", "status": "finished", "rating": 4.5},
                {"user_id": "7", "isbn": "0002", "status": "pending"}
            ]"#,
        )
        .unwrap();
        file.flush().unwrap();

        let records = read_library_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rating, Some(4.5));
        assert_eq!(records[1].status, ReadingStatus::Pending);
    }
}
