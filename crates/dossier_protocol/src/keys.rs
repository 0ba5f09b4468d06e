//! Stable key derivation for suggestions.

use blake3::Hasher;

const SEP: u8 = 0x1f;

fn hash_parts(parts: &[&str]) -> String {
    let mut hasher = Hasher::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(&[SEP]);
    }
    hasher.finalize().to_hex().to_string()
}

/// Stable id for one physical file revision.
///
/// Components:
/// - remote path, lowercased (remote listings preserve case but compare
///   case-insensitively)
/// - revision marker
///
/// Re-listing the same (path, revision) yields the same id, so repeated
/// syncs upsert instead of duplicating; a content change yields a new
/// revision marker and therefore a new suggestion.
pub fn suggestion_key(remote_path: &str, revision: &str) -> String {
    hash_parts(&[&remote_path.to_lowercase(), revision])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_stable() {
        let a = suggestion_key("/CASES/ABC123/passport.jpg", "rev-1");
        let b = suggestion_key("/CASES/ABC123/passport.jpg", "rev-1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_ignores_path_case() {
        let a = suggestion_key("/CASES/ABC123/Passport.JPG", "rev-1");
        let b = suggestion_key("/cases/abc123/passport.jpg", "rev-1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_new_revision_yields_new_key() {
        let a = suggestion_key("/CASES/ABC123/passport.jpg", "rev-1");
        let b = suggestion_key("/CASES/ABC123/passport.jpg", "rev-2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_separator_prevents_ambiguity() {
        let a = suggestion_key("/a/b", "c");
        let b = suggestion_key("/a", "bc");
        assert_ne!(a, b);
    }
}
