//! Product title normalization
//!
//! Folds a raw title into a canonical token form so that titles written with
//! different units, colors, languages and spacing become comparable:
//!
//! ```text
//! Смартфон Xiaomi Note 6.1" 8/128GB синий  ->  xiaomi note 6 1 inch 8/128 gb blue
//! ```
//!
//! The transformation steps run in a fixed order (later steps rely on earlier
//! ones), and the whole sequence is repeated until the output is stable, so a
//! normalized title normalizes to itself.

use crate::cache::BoundedCache;
use crate::config::{MatcherConfig, NormalizationTables};
use crate::item::{Item, NormalizedItem};
use crate::Result;
use regex::{NoExpand, Regex};
use std::borrow::Cow;

/// Placeholder title for items with no usable token at all
pub const EMPTY_TITLE_SENTINEL: &str = "emptytoken";

/// Upper bound on full normalization passes
const MAX_PASSES: usize = 4;

/// Characters replaced by the word "inch" (screen sizes like `6.1"`)
const INCH_MARKS: [char; 3] = ['"', '\u{201D}', '\u{201C}'];

/// Everything except word characters, whitespace, `+`, `/` and `-`
const PUNCTUATION: &str = r"[^\w\s+/\-]";

struct WordRule {
    pattern: Regex,
    replacement: String,
}

/// Deterministic title normalizer built from a set of lookup tables
pub struct TextNormalizer {
    enabled: bool,
    units: Vec<WordRule>,
    generic_words: Vec<WordRule>,
    colors: Vec<WordRule>,
    brand_fixes: Vec<(String, String)>,
    digit_slash_digit: Regex,
    digit_letter: Regex,
    letter_digit: Regex,
    punctuation: Regex,
    multispace: Regex,
}

fn compile_word_rules(table: &[(String, String)]) -> Result<Vec<WordRule>> {
    table
        .iter()
        .filter(|(from, _)| !from.is_empty())
        .map(|(from, to)| {
            Ok(WordRule {
                pattern: Regex::new(&format!(r"\b{}\b", regex::escape(from)))?,
                replacement: to.clone(),
            })
        })
        .collect()
}

fn apply_rules(mut text: String, rules: &[WordRule]) -> String {
    for rule in rules {
        if let Cow::Owned(replaced) = rule.pattern.replace_all(&text, NoExpand(&rule.replacement)) {
            text = replaced;
        }
    }
    text
}

fn replace_regex(text: String, re: &Regex, replacement: &str) -> String {
    match re.replace_all(&text, replacement) {
        Cow::Owned(replaced) => replaced,
        Cow::Borrowed(_) => text,
    }
}

impl TextNormalizer {
    pub fn new(tables: &NormalizationTables, enabled: bool) -> Result<Self> {
        Ok(Self {
            enabled,
            units: compile_word_rules(&tables.units)?,
            generic_words: compile_word_rules(&tables.generic_words)?,
            colors: compile_word_rules(&tables.colors)?,
            brand_fixes: tables
                .brand_fixes
                .iter()
                .filter(|(from, _)| !from.is_empty())
                .cloned()
                .collect(),
            digit_slash_digit: Regex::new(r"(\d)\s*/\s*(\d)")?,
            digit_letter: Regex::new(r"([0-9])([a-zа-я])")?,
            letter_digit: Regex::new(r"([a-zа-я])([0-9])")?,
            punctuation: Regex::new(PUNCTUATION)?,
            multispace: Regex::new(r"\s+")?,
        })
    }

    pub fn from_config(config: &MatcherConfig) -> Result<Self> {
        Self::new(&config.tables, config.normalize)
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Normalize a raw title. With normalization disabled the title is returned unchanged.
    pub fn normalize(&self, raw: &str) -> String {
        if !self.enabled {
            return raw.to_string();
        }
        let mut current = self.normalize_once(raw);
        for _ in 1..MAX_PASSES {
            let next = self.normalize_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// [`normalize`](Self::normalize) memoized on the exact raw string
    pub fn normalize_cached(&self, raw: &str, cache: &BoundedCache<String, String>) -> String {
        cache.get_or_insert_with(raw, || self.normalize(raw))
    }

    /// Normalize an item and apply the empty-result fallback.
    ///
    /// The returned flag is true when the fallback rule had to supply the title.
    pub fn normalize_item(
        &self,
        item: &Item,
        cache: &BoundedCache<String, String>,
    ) -> (NormalizedItem, bool) {
        let normalized = self.normalize_cached(&item.raw_title, cache);
        let degenerate = normalized.trim().is_empty();
        let normalized_title = if degenerate {
            self.fallback_title(&item.raw_title)
        } else {
            normalized
        };
        (
            NormalizedItem {
                id: item.id.clone(),
                raw_title: item.raw_title.clone(),
                normalized_title,
            },
            degenerate,
        )
    }

    /// First one or two tokens of the lower-cased, punctuation-stripped raw
    /// title, or [`EMPTY_TITLE_SENTINEL`] when there are none.
    pub fn fallback_title(&self, raw: &str) -> String {
        let lowered = raw.to_lowercase();
        let cleaned = self.punctuation.replace_all(&lowered, " ");
        let tokens: Vec<&str> = cleaned.split_whitespace().take(2).collect();
        if tokens.is_empty() {
            EMPTY_TITLE_SENTINEL.to_string()
        } else {
            tokens.join(" ")
        }
    }

    fn normalize_once(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }
        let mut s = raw.to_lowercase();
        if s.contains(INCH_MARKS) {
            s = s.replace(INCH_MARKS, " inch ");
        }
        s = apply_rules(s, &self.units);
        s = apply_rules(s, &self.generic_words);
        s = apply_rules(s, &self.colors);
        s = replace_regex(s, &self.digit_slash_digit, "${1}/${2}");
        s = replace_regex(s, &self.digit_letter, "${1} ${2}");
        s = replace_regex(s, &self.letter_digit, "${1} ${2}");
        s = replace_regex(s, &self.punctuation, " ");
        let mut s = self.multispace.replace_all(&s, " ").trim().to_string();
        for (from, to) in &self.brand_fixes {
            if s.contains(from.as_str()) {
                s = s.replace(from.as_str(), to);
            }
        }
        s
    }
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("enabled", &self.enabled)
            .field("units", &self.units.len())
            .field("generic_words", &self.generic_words.len())
            .field("colors", &self.colors.len())
            .field("brand_fixes", &self.brand_fixes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(&NormalizationTables::default(), true).unwrap()
    }

    #[test]
    fn test_full_title() {
        let n = normalizer();
        assert_eq!(
            n.normalize("Смартфон Xiaomi Note 6.1\" 8/128GB синий"),
            "xiaomi note 6 1 inch 8/128 gb blue"
        );
        assert_eq!(
            n.normalize("смартфон xiaomi note 6.1 8 128gb синий"),
            "xiaomi note 6 1 8 128 gb blue"
        );
    }

    #[test]
    fn test_unit_folding_after_split() {
        let n = normalizer();
        assert_eq!(n.normalize("Смартфон Xiaomi 8ГБ"), "xiaomi 8 gb");
        assert_eq!(n.normalize("смартфон xiaomi 8 GB"), "xiaomi 8 gb");
        assert_eq!(n.normalize("Планшет 64 гигабайт"), "64 gb");
    }

    #[test]
    fn test_whole_word_only() {
        let n = normalizer();
        // "гб" inside a longer word must survive
        assert_eq!(n.normalize("гбоу"), "гбоу");
        assert_eq!(n.normalize("телефонный кабель"), "телефонный кабель");
    }

    #[test]
    fn test_generic_words_in_order() {
        let n = normalizer();
        assert_eq!(n.normalize("Робот-пылесос Irbis X"), "robot vacuum irbis x");
        assert_eq!(n.normalize("Пылесос Dyson V11"), "vacuum dyson v 11");
    }

    #[test]
    fn test_inch_marks_and_slashes() {
        let n = normalizer();
        assert_eq!(n.normalize("Экран 15.6” 8 / 256"), "экран 15 6 inch 8/256");
        assert_eq!(n.normalize("“Galaxy S10+”"), "inch galaxy s 10+ inch");
    }

    #[test]
    fn test_colors_both_languages() {
        let n = normalizer();
        assert_eq!(n.normalize("Чехол КРАСНЫЙ"), "чехол red");
        assert_eq!(n.normalize("Case Red"), "case red");
    }

    #[test]
    fn test_idempotent() {
        let n = normalizer();
        for raw in [
            "Смартфон Xiaomi Note 6.1\" 8/128GB синий",
            "тел.8гб",
            "Робот-пылесос Irbis X",
            "S10+ (черный), 128Gb!!",
            "",
            "   ",
        ] {
            let once = n.normalize(raw);
            assert_eq!(n.normalize(&once), once, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_disabled_passes_through() {
        let n = TextNormalizer::new(&NormalizationTables::default(), false).unwrap();
        assert_eq!(n.normalize("Смартфон 8ГБ"), "Смартфон 8ГБ");
    }

    #[test]
    fn test_fallback_title() {
        let n = normalizer();
        assert_eq!(n.fallback_title("Смартфон, Телефон! Планшет"), "смартфон телефон");
        assert_eq!(n.fallback_title("!!!"), EMPTY_TITLE_SENTINEL);
        assert_eq!(n.fallback_title(""), EMPTY_TITLE_SENTINEL);
    }

    #[test]
    fn test_normalize_item_uses_fallback_for_empty_result() {
        let n = normalizer();
        let cache = BoundedCache::new(16);

        let (item, degenerate) = n.normalize_item(&Item::new("1", "Смартфон"), &cache);
        assert!(degenerate);
        assert_eq!(item.normalized_title, "смартфон");

        let (item, degenerate) = n.normalize_item(&Item::new("2", ""), &cache);
        assert!(degenerate);
        assert_eq!(item.normalized_title, EMPTY_TITLE_SENTINEL);

        let (item, degenerate) = n.normalize_item(&Item::new("3", "Xiaomi 8ГБ"), &cache);
        assert!(!degenerate);
        assert_eq!(item.normalized_title, "xiaomi 8 gb");
        assert_eq!(item.id, "3");
    }

    #[test]
    fn test_cache_hit_on_repeat() {
        let n = normalizer();
        let cache = BoundedCache::new(16);
        let first = n.normalize_cached("Xiaomi 8ГБ", &cache);
        let second = n.normalize_cached("Xiaomi 8ГБ", &cache);
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 1);
    }
}
