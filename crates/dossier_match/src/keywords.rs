//! Static per-slot keyword vocabulary.
//!
//! Keywords are stored folded and lowercased; the tokenizer applies the
//! same normalization to filenames, so Polish names with or without
//! diacritics hit the same entries ("urodzenia" matches both
//! "akt_urodzenia" and "akt urodzeń").
//!
//! Versioned alongside [`DocSlot`]: adding a category means a new slot key
//! in the case schema plus a keyword row here.

use dossier_protocol::DocSlot;

/// Slot → keyword list, the scoring input for [`crate::guess_slots`].
pub type KeywordTable = &'static [(DocSlot, &'static [&'static str])];

const TABLE: KeywordTable = &[
    (
        DocSlot::Birth,
        &["birth", "born", "urodzenia", "urodzenie", "urodzony", "urodzona", "metryka", "akt"],
    ),
    (
        DocSlot::Marriage,
        &["marriage", "married", "wedding", "malzenstwa", "malzenstwo", "slub", "slubu", "akt"],
    ),
    (
        DocSlot::Naturalization,
        &[
            "naturalization",
            "naturalisation",
            "naturalizacja",
            "naturalizacji",
            "citizenship",
            "obywatelstwo",
            "obywatelstwa",
        ],
    ),
    (DocSlot::Passport, &["passport", "paszport", "paszportu"]),
    (DocSlot::Death, &["death", "deceased", "zgon", "zgonu", "akt"]),
    (
        DocSlot::Residence,
        &["residence", "residency", "zamieszkania", "zameldowanie", "meldunek", "adres", "address"],
    ),
    (
        DocSlot::Military,
        &["military", "army", "wojsko", "wojskowa", "wojskowy", "ksiazeczka", "wku"],
    ),
    (
        DocSlot::Education,
        &["education", "school", "diploma", "dyplom", "swiadectwo", "szkola", "matura"],
    ),
    (
        DocSlot::Employment,
        &["employment", "employer", "praca", "pracy", "zatrudnienie", "zatrudnienia"],
    ),
    (
        DocSlot::Criminal,
        &["criminal", "police", "niekaralnosc", "niekaralnosci", "karny", "rejestr"],
    ),
    (
        DocSlot::NameChange,
        &["name", "change", "decree", "zmiana", "zmiany", "nazwiska"],
    ),
    (DocSlot::Other, &["other", "inne"]),
    (DocSlot::Misc, &["misc"]),
];

/// The built-in keyword table.
pub fn keyword_table() -> KeywordTable {
    TABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_normalized() {
        // The table must already be in folded lowercase form, or tokens
        // produced by the tokenizer could never hit it.
        for (_, keywords) in keyword_table() {
            for kw in *keywords {
                assert_eq!(
                    *kw,
                    crate::normalize::fold_diacritics(kw).to_lowercase(),
                    "keyword '{}' is not folded/lowercased",
                    kw
                );
            }
        }
    }

    #[test]
    fn test_every_slot_has_keywords() {
        for slot in DocSlot::ALL {
            assert!(
                keyword_table().iter().any(|(s, kws)| s == slot && !kws.is_empty()),
                "slot {} has no keyword row",
                slot
            );
        }
    }
}
