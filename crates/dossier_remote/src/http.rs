//! JSON-over-HTTP remote storage client.
//!
//! Speaks the cloud provider's folder-listing protocol: `files/list_folder`
//! with `recursive: true`, `files/list_folder/continue` with the returned
//! cursor while `has_more` is set, and `files/download` for content bytes.
//! All requests carry a bearer token.

use crate::error::{RemoteError, Result};
use crate::RemoteStore;
use async_trait::async_trait;
use chrono::DateTime;
use dossier_protocol::{EntryKind, FileEntry, ListPage};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn check(&self, response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            401 | 403 => RemoteError::Auth(format!("{}: {}", context, body)),
            404 | 409 => RemoteError::NotFound(context.to_string()),
            429 => RemoteError::RateLimited,
            _ => RemoteError::Decode(format!("{}: unexpected status {}: {}", context, status, body)),
        })
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn list_folder(&self, path: &str, cursor: Option<&str>) -> Result<ListPage> {
        let response = match cursor {
            None => {
                self.client
                    .post(self.endpoint("files/list_folder"))
                    .bearer_auth(&self.token)
                    .json(&ListFolderRequest {
                        path,
                        recursive: true,
                    })
                    .send()
                    .await?
            }
            Some(cursor) => {
                self.client
                    .post(self.endpoint("files/list_folder/continue"))
                    .bearer_auth(&self.token)
                    .json(&ListContinueRequest { cursor })
                    .send()
                    .await?
            }
        };

        let response = self.check(response, path).await?;
        let body: ListFolderResponse = response.json().await?;
        debug!(path, entries = body.entries.len(), has_more = body.has_more, "listed folder page");

        let entries = body
            .entries
            .into_iter()
            .map(EntryDto::into_file_entry)
            .collect::<Result<Vec<_>>>()?;
        Ok(ListPage {
            entries,
            next_cursor: body.has_more.then_some(body.cursor),
        })
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.endpoint("files/download"))
            .bearer_auth(&self.token)
            .json(&DownloadRequest { path })
            .send()
            .await?;
        let response = self.check(response, path).await?;
        let bytes = response.bytes().await?;
        debug!(path, size = bytes.len(), "downloaded file");
        Ok(bytes.to_vec())
    }
}

// ============================================================================
// Wire DTOs
// ============================================================================

#[derive(Serialize)]
struct ListFolderRequest<'a> {
    path: &'a str,
    recursive: bool,
}

#[derive(Serialize)]
struct ListContinueRequest<'a> {
    cursor: &'a str,
}

#[derive(Serialize)]
struct DownloadRequest<'a> {
    path: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListFolderResponse {
    entries: Vec<EntryDto>,
    cursor: String,
    has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct EntryDto {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
    path_display: Option<String>,
    path_lower: Option<String>,
    #[serde(default)]
    size: i64,
    rev: Option<String>,
    server_modified: Option<String>,
}

impl EntryDto {
    fn into_file_entry(self) -> Result<FileEntry> {
        let kind = match self.tag.as_str() {
            "file" => EntryKind::File,
            "folder" => EntryKind::Folder,
            other => {
                return Err(RemoteError::Decode(format!(
                    "unknown entry tag '{}' for '{}'",
                    other, self.name
                )))
            }
        };
        let path = self
            .path_display
            .or(self.path_lower)
            .ok_or_else(|| RemoteError::Decode(format!("entry '{}' has no path", self.name)))?;
        let modified_at = match self.server_modified.as_deref() {
            Some(ts) => DateTime::parse_from_rfc3339(ts)
                .map_err(|e| RemoteError::Decode(format!("bad timestamp '{}': {}", ts, e)))?
                .timestamp_millis(),
            None => 0,
        };
        Ok(FileEntry {
            path,
            name: self.name,
            kind,
            size_bytes: self.size,
            revision: self.rev.unwrap_or_default(),
            modified_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_response() {
        let json = r#"{
            "entries": [
                {
                    ".tag": "folder",
                    "name": "KOWALSKI_ANNA",
                    "path_display": "/CASES/KOWALSKI_ANNA",
                    "path_lower": "/cases/kowalski_anna"
                },
                {
                    ".tag": "file",
                    "name": "birth_cert_scan.pdf",
                    "path_display": "/CASES/KOWALSKI_ANNA/birth_cert_scan.pdf",
                    "path_lower": "/cases/kowalski_anna/birth_cert_scan.pdf",
                    "size": 48213,
                    "rev": "015f2a9c3d",
                    "server_modified": "2024-03-01T10:15:30Z"
                }
            ],
            "cursor": "AAAxyz",
            "has_more": true
        }"#;

        let parsed: ListFolderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert!(parsed.has_more);

        let folder = parsed.entries[0].clone().into_file_entry().unwrap();
        assert_eq!(folder.kind, EntryKind::Folder);
        assert_eq!(folder.revision, "");

        let file = parsed.entries[1].clone().into_file_entry().unwrap();
        assert_eq!(file.kind, EntryKind::File);
        assert_eq!(file.path, "/CASES/KOWALSKI_ANNA/birth_cert_scan.pdf");
        assert_eq!(file.size_bytes, 48213);
        assert_eq!(file.revision, "015f2a9c3d");
        assert!(file.modified_at > 0);
    }

    #[test]
    fn test_unknown_tag_is_decode_error() {
        let dto = EntryDto {
            tag: "deleted".to_string(),
            name: "x".to_string(),
            path_display: Some("/x".to_string()),
            path_lower: None,
            size: 0,
            rev: None,
            server_modified: None,
        };
        assert!(matches!(dto.into_file_entry(), Err(RemoteError::Decode(_))));
    }

    #[test]
    fn test_missing_path_is_decode_error() {
        let dto = EntryDto {
            tag: "file".to_string(),
            name: "x".to_string(),
            path_display: None,
            path_lower: None,
            size: 0,
            rev: None,
            server_modified: None,
        };
        assert!(matches!(dto.into_file_entry(), Err(RemoteError::Decode(_))));
    }
}
