//! URL slug generation for clubs.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref DISALLOWED: Regex = Regex::new(r"[^\w\s-]").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[\s_-]+").unwrap();
}

/// Lowercase, hyphen-separated slug. Text is NFKD-decomposed and accents
/// dropped, so `"Café"` becomes `"cafe"`.
///
/// `"ACM (Association for Computing Machinery)"` becomes
/// `"acm-association-for-computing-machinery"`.
pub fn generate_slug(text: &str) -> String {
    let lowered: String = text.to_lowercase().nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let cleaned = DISALLOWED.replace_all(&lowered, "");
    let hyphenated = SEPARATORS.replace_all(&cleaned, "-");
    hyphenated.trim_matches('-').to_string()
}

/// `base`, then `base-1`, `base-2`, ... until `taken` says no.
pub fn unique_slug(base: &str, mut taken: impl FnMut(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut counter = 1u32;
    loop {
        let candidate = format!("{base}-{counter}");
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug() {
        assert_eq!(
            generate_slug("ACM (Association for Computing Machinery)"),
            "acm-association-for-computing-machinery"
        );
        assert_eq!(generate_slug("  Women in STEM!! "), "women-in-stem");
        assert_eq!(generate_slug("snake_case -- and  spaces"), "snake-case-and-spaces");
        assert_eq!(generate_slug("---"), "");
    }

    #[test]
    fn test_generate_slug_folds_accents() {
        assert_eq!(generate_slug("Café Científico"), "cafe-cientifico");
        assert_eq!(generate_slug("ﬁnance ①"), "finance-1");
    }

    #[test]
    fn test_unique_slug_appends_counter() {
        let existing = ["acm", "acm-1"];
        let slug = unique_slug("acm", |s| existing.contains(&s));
        assert_eq!(slug, "acm-2");
        assert_eq!(unique_slug("ieee", |s| existing.contains(&s)), "ieee");
    }
}
