//! Dossier Remote - the narrow contract to the external storage tree.
//!
//! The engine only ever lists folders (cursor-paginated) and downloads
//! file bytes. Upload, delete and sharing stay with the case-management
//! application that owns the remote account.
//!
//! [`HttpRemote`] is the shipped implementation: JSON-over-HTTP endpoints
//! in the cloud provider's list/continue/download shape, bearer-token
//! authenticated. Tests use the in-memory fake from `dossier_test_utils`.

pub mod error;
pub mod http;

pub use error::{RemoteError, Result};
pub use http::HttpRemote;

use async_trait::async_trait;
use dossier_protocol::ListPage;

/// Remote storage contract: cursor-based folder listing and byte download.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List one page of entries under `path`, recursively. Pass the cursor
    /// from the previous page to continue; a `None` cursor in the returned
    /// page means the listing is complete.
    async fn list_folder(&self, path: &str, cursor: Option<&str>) -> Result<ListPage>;

    /// Download the full content of a file.
    async fn download(&self, path: &str) -> Result<Vec<u8>>;
}
