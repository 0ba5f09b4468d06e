//! In-memory remote storage tree with cursor pagination and injectable
//! failures.

use async_trait::async_trait;
use dossier_protocol::{EntryKind, FileEntry, ListPage};
use dossier_remote::{RemoteError, RemoteStore, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

struct StoredFile {
    bytes: Vec<u8>,
    revision: String,
    modified_at: i64,
}

#[derive(Default)]
struct RemoteState {
    files: BTreeMap<String, StoredFile>,
    fail_page: Option<usize>,
    fail_downloads: HashSet<String>,
    auth_failure: bool,
    download_calls: usize,
    list_calls: usize,
}

/// Fake remote tree. Listing is recursive under the requested path and
/// paginated by `page_size`; folder entries are synthesized from file
/// paths the way a real listing reports them.
pub struct InMemoryRemote {
    state: Mutex<RemoteState>,
    page_size: usize,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(RemoteState::default()),
            page_size: page_size.max(1),
        }
    }

    pub fn put_file(&self, path: &str, bytes: &[u8], revision: &str, modified_at: i64) {
        self.lock().files.insert(
            path.to_string(),
            StoredFile {
                bytes: bytes.to_vec(),
                revision: revision.to_string(),
                modified_at,
            },
        );
    }

    pub fn remove_file(&self, path: &str) {
        self.lock().files.remove(path);
    }

    /// Fail the page request with the given zero-based index.
    pub fn fail_page(&self, page_index: usize) {
        self.lock().fail_page = Some(page_index);
    }

    pub fn fail_download(&self, path: &str) {
        self.lock().fail_downloads.insert(path.to_string());
    }

    pub fn set_auth_failure(&self, on: bool) {
        self.lock().auth_failure = on;
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.fail_page = None;
        state.fail_downloads.clear();
        state.auth_failure = false;
    }

    pub fn download_calls(&self) -> usize {
        self.lock().download_calls
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RemoteState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Full recursive listing under `path`: synthesized folder entries
    /// first, then files, in path order.
    fn all_entries(state: &RemoteState, path: &str) -> Vec<FileEntry> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut folders: BTreeSet<String> = BTreeSet::new();
        let mut files: Vec<FileEntry> = Vec::new();

        for (file_path, file) in &state.files {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                continue;
            };
            let mut ancestor = String::from(path.trim_end_matches('/'));
            let segments: Vec<&str> = rest.split('/').collect();
            for segment in &segments[..segments.len().saturating_sub(1)] {
                ancestor = format!("{}/{}", ancestor, segment);
                folders.insert(ancestor.clone());
            }
            files.push(FileEntry {
                path: file_path.clone(),
                name: segments.last().unwrap_or(&rest).to_string(),
                kind: EntryKind::File,
                size_bytes: file.bytes.len() as i64,
                revision: file.revision.clone(),
                modified_at: file.modified_at,
            });
        }

        let mut entries: Vec<FileEntry> = folders
            .into_iter()
            .map(|folder_path| FileEntry {
                name: folder_path.rsplit('/').next().unwrap_or_default().to_string(),
                path: folder_path,
                kind: EntryKind::Folder,
                size_bytes: 0,
                revision: String::new(),
                modified_at: 0,
            })
            .collect();
        entries.extend(files);
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn list_folder(&self, path: &str, cursor: Option<&str>) -> Result<ListPage> {
        let mut state = self.lock();
        state.list_calls += 1;
        if state.auth_failure {
            return Err(RemoteError::Auth("invalid token".to_string()));
        }

        let offset: usize = match cursor {
            None => 0,
            Some(raw) => raw
                .parse()
                .map_err(|_| RemoteError::Decode(format!("bad cursor '{}'", raw)))?,
        };
        let page_index = offset / self.page_size;
        if state.fail_page == Some(page_index) {
            return Err(RemoteError::Io(format!(
                "injected failure on page {}",
                page_index
            )));
        }

        let entries = Self::all_entries(&state, path);
        let page: Vec<FileEntry> = entries
            .iter()
            .skip(offset)
            .take(self.page_size)
            .cloned()
            .collect();
        let next_offset = offset + page.len();
        let next_cursor = (next_offset < entries.len()).then(|| next_offset.to_string());

        Ok(ListPage {
            entries: page,
            next_cursor,
        })
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let mut state = self.lock();
        state.download_calls += 1;
        if state.auth_failure {
            return Err(RemoteError::Auth("invalid token".to_string()));
        }
        if state.fail_downloads.contains(path) {
            return Err(RemoteError::Io(format!("injected download failure: {}", path)));
        }
        state
            .files
            .get(path)
            .map(|f| f.bytes.clone())
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))
    }
}
