//! Slot scoring: filename tokens against the keyword table.

use crate::keywords::{keyword_table, KeywordTable};
use crate::normalize::tokenize_filename;
use dossier_protocol::{DocSlot, SlotMatch};

/// Guesses below this confidence are dropped (before the fallback rule).
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.2;

/// A suggestion carries at most this many ranked guesses.
pub const MAX_GUESSES: usize = 3;

/// Confidence assigned to the fallback guess when nothing scores.
const FALLBACK_CONFIDENCE: f64 = 0.05;

const EXACT_WEIGHT: f64 = 1.0;
const PARTIAL_WEIGHT: f64 = 0.5;

/// Score a filename against the built-in keyword table.
///
/// Always returns at least one match: when no slot clears the threshold the
/// result is a single low-confidence [`DocSlot::Misc`] fallback, so the
/// review queue always has a guess to confirm or override.
pub fn guess_slots(file_name: &str) -> Vec<SlotMatch> {
    guess_slots_with(file_name, keyword_table(), DEFAULT_MIN_CONFIDENCE)
}

/// Score a filename against an explicit keyword table and threshold.
///
/// Deterministic: the same inputs always produce the same ranked output.
/// Ties sort by table order so reordering keyword rows is a behavior change.
pub fn guess_slots_with(
    file_name: &str,
    table: KeywordTable,
    min_confidence: f64,
) -> Vec<SlotMatch> {
    let tokens = tokenize_filename(file_name);
    if tokens.is_empty() {
        return vec![fallback()];
    }

    let mut scored: Vec<SlotMatch> = table
        .iter()
        .filter_map(|(slot, keywords)| {
            let score: f64 = tokens.iter().map(|t| token_score(t, keywords)).sum();
            if score <= 0.0 {
                return None;
            }
            let confidence = (score / tokens.len() as f64).min(1.0);
            (confidence >= min_confidence).then_some(SlotMatch {
                slot: *slot,
                confidence,
            })
        })
        .collect();

    if scored.is_empty() {
        return vec![fallback()];
    }

    // Stable sort keeps table order for equal confidences.
    scored.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(MAX_GUESSES);
    scored
}

/// Best weight this token earns within one category's keyword list.
fn token_score(token: &str, keywords: &[&str]) -> f64 {
    let mut best = 0.0f64;
    for kw in keywords {
        let weight = if token == *kw {
            EXACT_WEIGHT
        } else if token.len() >= 4 && kw.len() >= 4 && (token.contains(kw) || kw.contains(token)) {
            PARTIAL_WEIGHT
        } else {
            continue;
        };
        if weight > best {
            best = weight;
        }
        if best >= EXACT_WEIGHT {
            break;
        }
    }
    best
}

fn fallback() -> SlotMatch {
    SlotMatch {
        slot: DocSlot::Misc,
        confidence: FALLBACK_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polish_birth_certificate() {
        let guesses = guess_slots("Jan_Kowalski_akt_urodzenia.pdf");
        assert_eq!(guesses[0].slot, DocSlot::Birth);
        assert!(guesses[0].confidence > 0.0);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let first = guess_slots("Jan_Kowalski_akt_urodzenia.pdf");
        for _ in 0..10 {
            assert_eq!(guess_slots("Jan_Kowalski_akt_urodzenia.pdf"), first);
        }
    }

    #[test]
    fn test_single_token_exact_hit() {
        let guesses = guess_slots("passport.jpg");
        assert_eq!(guesses[0].slot, DocSlot::Passport);
        assert!((guesses[0].confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_english_birth_cert() {
        let guesses = guess_slots("birth_cert_scan.pdf");
        assert_eq!(guesses[0].slot, DocSlot::Birth);
    }

    #[test]
    fn test_fallback_when_nothing_scores() {
        let guesses = guess_slots("IMG_20240101_123456.jpg");
        assert_eq!(guesses.len(), 1);
        assert_eq!(guesses[0].slot, DocSlot::Misc);
        assert!(guesses[0].confidence < DEFAULT_MIN_CONFIDENCE);
    }

    #[test]
    fn test_guess_cap() {
        // "akt" alone scores in birth, marriage and death; the cap holds.
        let guesses = guess_slots("akt_urodzenia_i_malzenstwa_i_zgonu.pdf");
        assert!(guesses.len() <= MAX_GUESSES);
    }

    #[test]
    fn test_confidence_in_unit_interval() {
        for name in [
            "passport_paszport_passport.pdf",
            "birth.pdf",
            "x.pdf",
            "akt_urodzenia.pdf",
        ] {
            for m in guess_slots(name) {
                assert!(m.confidence > 0.0 && m.confidence <= 1.0, "{}: {:?}", name, m);
            }
        }
    }

    #[test]
    fn test_partial_match_scores_lower() {
        // "passports" only substring-matches "passport".
        let exact = guess_slots("passport.pdf")[0].confidence;
        let partial = guess_slots("passports.pdf")[0].confidence;
        assert!(partial < exact);
    }

    #[test]
    fn test_custom_threshold() {
        // With an impossible threshold everything falls back to misc.
        let guesses = guess_slots_with("passport.jpg", keyword_table(), 1.5);
        assert_eq!(guesses[0].slot, DocSlot::Misc);
    }
}
