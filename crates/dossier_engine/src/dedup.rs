//! Duplicate suppression for freshly observed candidates.
//!
//! Two layers, evaluated in order:
//! 1. exact - same content hash at the same remote path is a
//!    re-observation of one physical file (a metadata touch bumped the
//!    revision marker without changing bytes);
//! 2. near - same display name and size within a short window of an
//!    existing suggestion is the same upload event seen twice.
//!
//! Identical bytes at *different* paths are genuinely separate remote
//! copies and are never collapsed.

use dossier_protocol::{FileEntry, SuggestionStatus};
use dossier_store::ScanIndexRow;
use std::collections::{HashMap, HashSet};

/// A downloaded, fingerprinted file waiting to become a suggestion.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub entry: FileEntry,
    pub content_hash: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    /// Same path, same bytes: the existing row absorbs the new revision.
    SamePathAndHash,
    /// Same name and size within the time window: same upload event.
    NearMatch,
}

/// Index over existing suggestions, built once per poll cycle.
///
/// `error` rows are excluded on purpose: a failed download must not
/// suppress its own retry.
pub struct DedupIndex {
    by_path_hash: HashSet<(String, String)>,
    by_name_size: HashMap<(String, i64), Vec<i64>>,
}

impl DedupIndex {
    pub fn from_rows(rows: &[ScanIndexRow]) -> Self {
        let mut by_path_hash = HashSet::new();
        let mut by_name_size: HashMap<(String, i64), Vec<i64>> = HashMap::new();
        for row in rows {
            if row.status == SuggestionStatus::Error {
                continue;
            }
            if let Some(hash) = &row.content_hash {
                by_path_hash.insert((row.remote_path.to_lowercase(), hash.clone()));
            }
            by_name_size
                .entry((row.display_name.to_lowercase(), row.size_bytes))
                .or_default()
                .push(row.revised_at);
        }
        Self {
            by_path_hash,
            by_name_size,
        }
    }

    /// Classify a candidate against the existing suggestions.
    pub fn duplicate_of(&self, candidate: &Candidate, window_ms: i64) -> Option<DuplicateKind> {
        let path_key = (
            candidate.entry.path.to_lowercase(),
            candidate.content_hash.clone(),
        );
        if self.by_path_hash.contains(&path_key) {
            return Some(DuplicateKind::SamePathAndHash);
        }

        let name_key = (
            candidate.entry.name.to_lowercase(),
            candidate.entry.size_bytes,
        );
        if let Some(timestamps) = self.by_name_size.get(&name_key) {
            let near = timestamps
                .iter()
                .any(|t| (candidate.entry.modified_at - t).abs() <= window_ms);
            if near {
                return Some(DuplicateKind::NearMatch);
            }
        }
        None
    }
}

/// Collapse multiple observations of one physical file within a single
/// batch, keeping the most recent revision. Paginated listings and editor
/// save-churn can report the same file several times per cycle.
pub fn collapse_to_latest(batch: Vec<Candidate>) -> Vec<Candidate> {
    let mut latest: HashMap<(String, String), Candidate> = HashMap::new();
    for candidate in batch {
        let key = (
            candidate.entry.path.to_lowercase(),
            candidate.content_hash.clone(),
        );
        match latest.get(&key) {
            Some(existing) if existing.entry.modified_at >= candidate.entry.modified_at => {}
            _ => {
                latest.insert(key, candidate);
            }
        }
    }
    let mut collapsed: Vec<Candidate> = latest.into_values().collect();
    collapsed.sort_by(|a, b| a.entry.path.cmp(&b.entry.path));
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_protocol::EntryKind;

    fn candidate(path: &str, name: &str, size: i64, hash: &str, modified_at: i64) -> Candidate {
        Candidate {
            entry: FileEntry {
                path: path.to_string(),
                name: name.to_string(),
                kind: EntryKind::File,
                size_bytes: size,
                revision: format!("rev-{}", modified_at),
                modified_at,
            },
            content_hash: hash.to_string(),
            mime_type: None,
        }
    }

    fn row(
        path: &str,
        name: &str,
        size: i64,
        hash: Option<&str>,
        revised_at: i64,
        status: SuggestionStatus,
    ) -> ScanIndexRow {
        ScanIndexRow {
            remote_path: path.to_string(),
            revision: "rev-0".to_string(),
            status,
            display_name: name.to_string(),
            size_bytes: size,
            content_hash: hash.map(str::to_string),
            revised_at,
        }
    }

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn test_same_path_same_hash_is_duplicate() {
        let index = DedupIndex::from_rows(&[row(
            "/CASES/A1/scan.pdf",
            "scan.pdf",
            100,
            Some("h1"),
            T0,
            SuggestionStatus::Pending,
        )]);
        let c = candidate("/CASES/A1/scan.pdf", "scan.pdf", 100, "h1", T0 + 60_000);
        assert_eq!(
            index.duplicate_of(&c, 300_000),
            Some(DuplicateKind::SamePathAndHash)
        );
    }

    #[test]
    fn test_same_hash_different_path_is_kept() {
        let index = DedupIndex::from_rows(&[row(
            "/CASES/A1/scan.pdf",
            "scan.pdf",
            100,
            Some("h1"),
            T0,
            SuggestionStatus::Pending,
        )]);
        // Same bytes, different folder and name: a separate physical copy.
        let c = candidate("/CASES/B2/copy.pdf", "copy.pdf", 100, "h1", T0 + 60_000_000);
        assert_eq!(index.duplicate_of(&c, 300_000), None);
    }

    #[test]
    fn test_near_match_within_window() {
        let index = DedupIndex::from_rows(&[row(
            "/CASES/A1/scan.pdf",
            "scan.pdf",
            100,
            Some("h1"),
            T0,
            SuggestionStatus::Pending,
        )]);
        // Different hash and path but same name+size two minutes later.
        let c = candidate("/CASES/A1/sub/scan.pdf", "scan.pdf", 100, "h2", T0 + 120_000);
        assert_eq!(index.duplicate_of(&c, 300_000), Some(DuplicateKind::NearMatch));
    }

    #[test]
    fn test_near_match_outside_window_is_kept() {
        let index = DedupIndex::from_rows(&[row(
            "/CASES/A1/scan.pdf",
            "scan.pdf",
            100,
            Some("h1"),
            T0,
            SuggestionStatus::Pending,
        )]);
        let c = candidate("/CASES/A1/sub/scan.pdf", "scan.pdf", 100, "h2", T0 + 3_600_000);
        assert_eq!(index.duplicate_of(&c, 300_000), None);
    }

    #[test]
    fn test_error_rows_never_suppress_retry() {
        let index = DedupIndex::from_rows(&[row(
            "/CASES/A1/scan.pdf",
            "scan.pdf",
            100,
            None,
            T0,
            SuggestionStatus::Error,
        )]);
        let c = candidate("/CASES/A1/scan.pdf", "scan.pdf", 100, "h1", T0);
        assert_eq!(index.duplicate_of(&c, 300_000), None);
    }

    #[test]
    fn test_collapse_keeps_latest_revision() {
        let batch = vec![
            candidate("/CASES/A1/scan.pdf", "scan.pdf", 100, "h1", T0),
            candidate("/CASES/A1/scan.pdf", "scan.pdf", 100, "h1", T0 + 5_000),
            candidate("/CASES/A1/scan.pdf", "scan.pdf", 100, "h1", T0 + 1_000),
        ];
        let collapsed = collapse_to_latest(batch);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].entry.modified_at, T0 + 5_000);
    }

    #[test]
    fn test_collapse_preserves_distinct_paths() {
        let batch = vec![
            candidate("/CASES/A1/scan.pdf", "scan.pdf", 100, "h1", T0),
            candidate("/CASES/B2/scan.pdf", "scan.pdf", 100, "h1", T0),
        ];
        let collapsed = collapse_to_latest(batch);
        assert_eq!(collapsed.len(), 2);
    }
}
