//! Dossier Match - case and document-slot guessing
//!
//! Pure string heuristics, no I/O. Given the same filename and keyword
//! table the matcher always produces the same ranked guesses; given the
//! same path and known-case list it always produces the same case guess.
//! That determinism is what makes the review queue reproducible and the
//! module unit-testable in isolation.
//!
//! The matcher never blocks the pipeline: an ambiguous case resolves to no
//! guess, an unscoreable filename resolves to a single low-confidence
//! fallback slot.

pub mod cases;
pub mod keywords;
pub mod normalize;
pub mod slots;

pub use cases::{extract_case_token, guess_case};
pub use keywords::{keyword_table, KeywordTable};
pub use slots::{guess_slots, guess_slots_with, DEFAULT_MIN_CONFIDENCE, MAX_GUESSES};
