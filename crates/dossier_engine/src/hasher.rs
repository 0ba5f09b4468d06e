//! Content fingerprinting.
//!
//! The digest is computed over file bytes only - never filename, path or
//! timestamps - so the same scan uploaded twice always fingerprints
//! identically regardless of where it lands in the tree.

/// Hex digest of the file content.
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Best-effort MIME type from the filename extension. Limited to the
/// formats staff actually upload; anything else stays untyped.
pub fn mime_for_name(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let bytes = b"scanned document bytes";
        assert_eq!(fingerprint(bytes), fingerprint(bytes));
    }

    #[test]
    fn test_content_sensitivity() {
        assert_ne!(fingerprint(b"a"), fingerprint(b"b"));
        assert_ne!(fingerprint(b""), fingerprint(b"a"));
    }

    #[test]
    fn test_digest_is_hex() {
        let digest = fingerprint(b"x");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_mime_guess() {
        assert_eq!(mime_for_name("scan.PDF"), Some("application/pdf"));
        assert_eq!(mime_for_name("photo.jpeg"), Some("image/jpeg"));
        assert_eq!(mime_for_name("unknown.xyz"), None);
        assert_eq!(mime_for_name("no_extension"), None);
    }
}
