//! Case guessing from the remote path convention.
//!
//! Staff file scans under `/CASES/{token}/...` where the token is either a
//! short case code (`ABC123`) or a `LASTNAME_FIRSTNAME` client-name folder.
//! The guess is best-effort: an exact code match wins, a name-shaped token
//! is folded and matched against known case display names, and anything
//! ambiguous resolves to no guess at all. A wrong case guess costs a
//! reviewer more than a missing one.

use crate::normalize::fold_diacritics;
use dossier_protocol::CaseRef;
use once_cell::sync::Lazy;
use regex::Regex;

/// `LASTNAME_FIRSTNAME`-shaped folder token, two to four name parts.
static NAME_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]+(?:_[A-Za-z]+){1,3}$").expect("static regex must compile")
});

/// Extract the case token from a remote path: the folder segment
/// immediately under the configured root.
///
/// Files sitting directly in the root have no case folder and yield no
/// token.
pub fn extract_case_token(remote_path: &str, root: &str) -> Option<String> {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return None;
    }
    let path_lower = remote_path.to_lowercase();
    let root_lower = root.to_lowercase();
    if !path_lower.starts_with(&root_lower) {
        return None;
    }
    let rest = &remote_path[root.len()..];
    let rest = rest.strip_prefix('/')?;
    let (token, remainder) = rest.split_once('/')?;
    if token.is_empty() || remainder.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Resolve a case token against the known cases.
///
/// Exact (case-insensitive) case-code match wins. Otherwise a name-shaped
/// token matches when every folded name part occurs in exactly one case's
/// folded display name; zero or multiple hits yield no guess.
pub fn guess_case(token: &str, cases: &[CaseRef]) -> Option<String> {
    if let Some(hit) = cases.iter().find(|c| c.code.eq_ignore_ascii_case(token)) {
        return Some(hit.id.clone());
    }

    let folded = fold_diacritics(token);
    if !NAME_TOKEN_RE.is_match(&folded) {
        return None;
    }
    let parts: Vec<String> = folded.to_lowercase().split('_').map(str::to_string).collect();

    let mut hits = cases.iter().filter(|c| {
        let name = fold_diacritics(&c.display_name).to_lowercase();
        parts.iter().all(|p| name.contains(p.as_str()))
    });

    let first = hits.next()?;
    if hits.next().is_some() {
        // Ambiguous - leave it to the reviewer.
        return None;
    }
    Some(first.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str, code: &str, name: &str) -> CaseRef {
        CaseRef {
            id: id.to_string(),
            code: code.to_string(),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(
            extract_case_token("/CASES/SMITH_JOHN/passport.jpg", "/CASES"),
            Some("SMITH_JOHN".to_string())
        );
        assert_eq!(
            extract_case_token("/CASES/ABC123/sub/file.pdf", "/CASES"),
            Some("ABC123".to_string())
        );
    }

    #[test]
    fn test_extract_token_root_file_has_none() {
        assert_eq!(extract_case_token("/CASES/loose_scan.pdf", "/CASES"), None);
    }

    #[test]
    fn test_extract_token_outside_root() {
        assert_eq!(extract_case_token("/OTHER/ABC123/file.pdf", "/CASES"), None);
    }

    #[test]
    fn test_extract_token_root_case_insensitive() {
        assert_eq!(
            extract_case_token("/cases/ABC123/file.pdf", "/CASES"),
            Some("ABC123".to_string())
        );
    }

    #[test]
    fn test_exact_code_match() {
        let cases = [case("c1", "ABC123", "John Smith")];
        assert_eq!(guess_case("ABC123", &cases), Some("c1".to_string()));
        assert_eq!(guess_case("abc123", &cases), Some("c1".to_string()));
    }

    #[test]
    fn test_name_token_match() {
        let cases = [
            case("c1", "ABC123", "Anna Kowalski"),
            case("c2", "XYZ789", "John Smith"),
        ];
        assert_eq!(guess_case("KOWALSKI_ANNA", &cases), Some("c1".to_string()));
        assert_eq!(guess_case("SMITH_JOHN", &cases), Some("c2".to_string()));
    }

    #[test]
    fn test_name_token_diacritic_folded() {
        let cases = [case("c1", "PL0001", "Józef Wiśniewski")];
        assert_eq!(guess_case("WISNIEWSKI_JOZEF", &cases), Some("c1".to_string()));
    }

    #[test]
    fn test_ambiguous_yields_none() {
        let cases = [
            case("c1", "A1", "John Smith"),
            case("c2", "A2", "John Smithson"),
        ];
        assert_eq!(guess_case("SMITH_JOHN", &cases), None);
    }

    #[test]
    fn test_unknown_token_yields_none() {
        let cases = [case("c1", "ABC123", "John Smith")];
        assert_eq!(guess_case("ZZZ999", &cases), None);
        assert_eq!(guess_case("NOWAK_JAN", &cases), None);
    }

    #[test]
    fn test_non_name_shape_is_not_name_matched() {
        // Numeric tokens never match display names even as substrings.
        let cases = [case("c1", "ABC123", "Case 42")];
        assert_eq!(guess_case("42", &cases), None);
    }
}
