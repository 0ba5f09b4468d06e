//! Filename and token normalization.
//!
//! Staff upload scans named in a mix of English and Polish, with and
//! without diacritics. Everything is compared in folded, lowercased,
//! separator-split form.

/// Fold diacritics to their ASCII base letter. Covers Polish plus the
/// Latin-1 accents that show up in scanned-document names.
pub fn fold_diacritics(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            'ą' | 'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => out.push('a'),
            'Ą' | 'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => out.push('A'),
            'ć' | 'ç' | 'č' => out.push('c'),
            'Ć' | 'Ç' | 'Č' => out.push('C'),
            'ę' | 'é' | 'è' | 'ê' | 'ë' | 'ě' => out.push('e'),
            'Ę' | 'É' | 'È' | 'Ê' | 'Ë' | 'Ě' => out.push('E'),
            'í' | 'ì' | 'î' | 'ï' => out.push('i'),
            'Í' | 'Ì' | 'Î' | 'Ï' => out.push('I'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            'ń' | 'ñ' => out.push('n'),
            'Ń' | 'Ñ' => out.push('N'),
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => out.push('o'),
            'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => out.push('O'),
            'ś' | 'š' => out.push('s'),
            'Ś' | 'Š' => out.push('S'),
            'ú' | 'ù' | 'û' | 'ü' => out.push('u'),
            'Ú' | 'Ù' | 'Û' | 'Ü' => out.push('U'),
            'ý' | 'ÿ' => out.push('y'),
            'Ý' => out.push('Y'),
            'ź' | 'ż' | 'ž' => out.push('z'),
            'Ź' | 'Ż' | 'Ž' => out.push('Z'),
            'ß' => out.push_str("ss"),
            _ => out.push(ch),
        }
    }
    out
}

/// Strip a short trailing extension (`scan.pdf` → `scan`). Names without a
/// recognizable extension pass through untouched.
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            stem
        }
        _ => name,
    }
}

/// Normalize a filename into comparison tokens: strip extension, fold
/// diacritics, lowercase, split on separators, drop one-character scraps.
pub fn tokenize_filename(name: &str) -> Vec<String> {
    let stem = strip_extension(name);
    fold_diacritics(stem)
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(|t| t.to_string())
        .collect()
}
