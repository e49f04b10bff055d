//! Translation quality assessment.
//!
//! Computes a multi-metric quality score for a (source, translated) pair
//! without calling any external service. The overall score is a fixed
//! weighted sum of four structural sub-metrics (length-ratio fitness,
//! lexical similarity, sentence structure, token preservation) so tests can
//! assert exact values on fixed inputs. Format/markup preservation checks
//! (tags, URLs, emails, hashtags, mentions, currency, numbers) and the
//! case-pattern score are reported in the `metrics` map but do not move the
//! headline score.
//!
//! Grammar heuristics (capitalization, repeated words, subject-verb
//! agreement) are only reliable for English and run only when the target
//! language is English; other targets produce no grammar issues rather than
//! false positives.

use crate::languages::{LanguageRegistry, LanguageRules};
use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use tracing::warn;

/// Version tag stored alongside persisted quality scores.
///
/// Bump this when the scoring formula changes; stored scores with an older
/// version are re-assessed locally on lookup instead of being trusted.
pub const QUALITY_VERSION: u32 = 1;

/// Confidence reported for scores served from cache or translation memory.
pub const KNOWN_GOOD_CONFIDENCE: f64 = 0.9;

// Weights of the structural sub-metrics; must sum to 1.0
const WEIGHT_LENGTH: f64 = 0.2;
const WEIGHT_DISTANCE: f64 = 0.3;
const WEIGHT_STRUCTURE: f64 = 0.3;
const WEIGHT_PRESERVATION: f64 = 0.2;

// Score assigned to the length sub-metric when the ratio is out of band
const OUT_OF_BAND_LENGTH_SCORE: f64 = 0.5;

/// Structured multi-metric assessment of a translation.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    /// Overall quality in [0, 1]
    pub score: f64,
    /// Confidence in the assessment, in [0, 1]
    pub confidence: f64,
    /// Human-readable problems found, in detection order
    pub issues: Vec<String>,
    /// Named sub-scores, each in [0, 1]
    pub metrics: BTreeMap<String, f64>,
}

impl QualityReport {
    /// Report for unusable input or a failed assessment.
    pub fn zeroed(issue: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            confidence: 0.0,
            issues: vec![issue.into()],
            metrics: BTreeMap::new(),
        }
    }

    /// Report synthesized for a cache or memory hit: the stored score is
    /// reused and confidence reflects "served from a known-good source"
    /// rather than a fresh computation.
    pub fn from_stored(score: f64) -> Self {
        Self {
            score,
            confidence: KNOWN_GOOD_CONFIDENCE,
            issues: Vec::new(),
            metrics: BTreeMap::new(),
        }
    }
}

/// Quality assessment engine.
#[derive(Debug, Clone)]
pub struct QualityAssessor {
    /// Acceptable band for len(translated) / len(original)
    length_ratio_band: (f64, f64),
    /// Normalized edit distance above which confidence is penalized
    max_edit_distance: f64,
}

impl Default for QualityAssessor {
    fn default() -> Self {
        Self {
            length_ratio_band: (0.7, 1.3),
            max_edit_distance: 0.3,
        }
    }
}

impl QualityAssessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assess a (source, translated) pair.
    ///
    /// Never fails: an internal assessment error degrades to a zeroed report
    /// with an explanatory issue, since a translation with unknown quality is
    /// still more useful to the caller than no translation.
    pub fn assess(
        &self,
        original: &str,
        translated: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> QualityReport {
        match self.try_assess(original, translated, source_lang, target_lang) {
            Ok(report) => report,
            Err(e) => {
                warn!("quality assessment failed: {}", e);
                QualityReport::zeroed(format!("quality assessment failed: {}", e))
            }
        }
    }

    fn try_assess(
        &self,
        original: &str,
        translated: &str,
        _source_lang: &str,
        target_lang: &str,
    ) -> Result<QualityReport> {
        // Ratio and distance computations all divide by source length;
        // short-circuit before any of them can see an empty side.
        if original.trim().is_empty() || translated.trim().is_empty() {
            return Ok(QualityReport::zeroed("empty input"));
        }

        let rules = LanguageRegistry::get().rules_or_default(target_lang);

        let original_len = original.chars().count() as f64;
        let translated_len = translated.chars().count() as f64;
        let length_ratio = translated_len / original_len;

        let edit_distance = normalized_edit_distance(original, translated);
        let structure = sentence_structure_score(translated, rules);
        let preservation = token_preservation(original, translated);

        let mut issues = Vec::new();
        let (band_low, band_high) = self.length_ratio_band;
        if length_ratio < band_low {
            issues.push(format!("Translation too short (ratio: {:.2})", length_ratio));
        } else if length_ratio > band_high {
            issues.push(format!("Translation too long (ratio: {:.2})", length_ratio));
        }

        let grammar = grammar_issues(translated, target_lang);
        issues.extend(grammar.iter().cloned());

        let length_in_band = (band_low..=band_high).contains(&length_ratio);
        let length_score = if length_in_band {
            1.0
        } else {
            OUT_OF_BAND_LENGTH_SCORE
        };
        let distance_score = 1.0 - edit_distance;

        let mut score = length_score * WEIGHT_LENGTH
            + distance_score * WEIGHT_DISTANCE
            + structure * WEIGHT_STRUCTURE
            + preservation * WEIGHT_PRESERVATION;

        if !grammar.is_empty() {
            score *= 1.0 - (grammar.len() as f64 * 0.1).min(0.5);
        }
        score = score.clamp(0.0, 1.0);

        let mut confidence = score;
        if !length_in_band {
            confidence *= 0.8;
        }
        if edit_distance > self.max_edit_distance {
            confidence *= 0.8;
        }
        if !issues.is_empty() {
            confidence *= 1.0 - (issues.len() as f64 * 0.1).min(0.5);
        }
        confidence = confidence.clamp(0.0, 1.0);

        let mut metrics = BTreeMap::new();
        metrics.insert("length_fitness".to_string(), length_score);
        metrics.insert("lexical_similarity".to_string(), distance_score);
        metrics.insert("sentence_structure".to_string(), structure);
        metrics.insert("token_preservation".to_string(), preservation);
        metrics.insert(
            "case_pattern".to_string(),
            case_pattern_score(original, translated),
        );
        metrics.insert(
            "tag_preservation".to_string(),
            pattern_preservation(tag_regex(), original, translated),
        );
        metrics.insert(
            "url_preservation".to_string(),
            pattern_preservation(url_regex(), original, translated),
        );
        metrics.insert(
            "email_preservation".to_string(),
            pattern_preservation(email_regex(), original, translated),
        );
        metrics.insert(
            "hashtag_preservation".to_string(),
            pattern_preservation(hashtag_regex(), original, translated),
        );
        metrics.insert(
            "mention_preservation".to_string(),
            pattern_preservation(mention_regex(), original, translated),
        );
        metrics.insert(
            "currency_preservation".to_string(),
            pattern_preservation(currency_regex(), original, translated),
        );
        metrics.insert(
            "number_preservation".to_string(),
            pattern_preservation(number_regex(), original, translated),
        );

        Ok(QualityReport {
            score,
            confidence,
            issues,
            metrics,
        })
    }
}

/// Break text into word tokens and single-character punctuation tokens.
///
/// Alphanumeric runs (Unicode-aware) become one token each; every other
/// non-whitespace character is its own token.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in text.chars() {
        if c.is_alphanumeric() {
            word.push(c);
        } else {
            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }
            if !c.is_whitespace() {
                tokens.push(c.to_string());
            }
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

/// Token-level Levenshtein distance.
fn levenshtein(a: &[String], b: &[String]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, token_a) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, token_b) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(token_a != token_b);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Normalized token-level edit distance between two texts, in [0, 1].
fn normalized_edit_distance(original: &str, translated: &str) -> f64 {
    let original_tokens = tokenize(&original.to_lowercase());
    let translated_tokens = tokenize(&translated.to_lowercase());

    if original_tokens.is_empty() || translated_tokens.is_empty() {
        return 1.0;
    }

    let distance = levenshtein(&original_tokens, &translated_tokens);
    let max_length = original_tokens.len().max(translated_tokens.len());
    distance as f64 / max_length as f64
}

/// Split text into sentences on `.`, `!`, `?`, keeping the terminator.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut buf = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        buf.push(c);
        if matches!(c, '.' | '!' | '?') && !matches!(chars.peek(), Some('.' | '!' | '?')) {
            let sentence = buf.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            buf.clear();
        }
    }
    let sentence = buf.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
    sentences
}

/// Fraction-style score for sentence conventions: each sentence that fails a
/// capitalization or terminator check multiplies the score by 0.9.
fn sentence_structure_score(text: &str, rules: &LanguageRules) -> f64 {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return 0.0;
    }

    let mut score: f64 = 1.0;
    for sentence in &sentences {
        if rules.capitalization {
            let starts_upper = sentence
                .chars()
                .next()
                .map(|c| c.is_uppercase())
                .unwrap_or(false);
            if !starts_upper {
                score *= 0.9;
            }
        }

        let ends_ok = sentence
            .chars()
            .last()
            .map(|c| rules.sentence_endings.contains(&c))
            .unwrap_or(false);
        if !ends_ok {
            score *= 0.9;
        }
    }
    score
}

/// Fraction of distinct source tokens (case-folded) also present in the
/// translation. A crude proxy for named-entity/number/term preservation.
fn token_preservation(original: &str, translated: &str) -> f64 {
    let original_tokens: HashSet<String> = tokenize(&original.to_lowercase()).into_iter().collect();
    let translated_tokens: HashSet<String> =
        tokenize(&translated.to_lowercase()).into_iter().collect();

    if original_tokens.is_empty() {
        return 0.0;
    }

    let preserved = original_tokens.intersection(&translated_tokens).count();
    preserved as f64 / original_tokens.len() as f64
}

/// Character-by-character upper/lower-case pattern agreement, over the
/// aligned prefix, normalized by the source length.
fn case_pattern_score(original: &str, translated: &str) -> f64 {
    let original_len = original.chars().count();
    if original_len == 0 {
        return 0.0;
    }

    let matches = original
        .chars()
        .zip(translated.chars())
        .filter(|(a, b)| a.is_uppercase() == b.is_uppercase())
        .count();

    matches as f64 / original_len as f64
}

/// `preserved / source_count` for one pattern class; vacuously 1.0 when the
/// source contains no instances.
fn pattern_preservation(regex: &Regex, original: &str, translated: &str) -> f64 {
    let source: HashSet<&str> = regex.find_iter(original).map(|m| m.as_str()).collect();
    if source.is_empty() {
        return 1.0;
    }

    let target: HashSet<&str> = regex.find_iter(translated).map(|m| m.as_str()).collect();
    source.intersection(&target).count() as f64 / source.len() as f64
}

/// Subject-verb agreement errors common enough to pattern-match.
const AGREEMENT_ERRORS: &[(&str, &str, &str)] = &[
    ("i", "is", "I am"),
    ("they", "is", "they are"),
    ("he", "are", "he is"),
    ("she", "are", "she is"),
    ("it", "are", "it is"),
    ("we", "is", "we are"),
    ("you", "is", "you are"),
];

/// Grammar and punctuation heuristics.
///
/// Only reliable for English targets; any other target language yields no
/// issues rather than risking false positives.
fn grammar_issues(text: &str, target_lang: &str) -> Vec<String> {
    if target_lang != "en" {
        return Vec::new();
    }

    let mut issues = Vec::new();
    let sentences = split_sentences(text);

    for (i, sentence) in sentences.iter().enumerate() {
        let starts_upper = sentence
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false);
        if !starts_upper {
            issues.push(format!(
                "Sentence {} should start with a capital letter",
                i + 1
            ));
        }

        let words: Vec<String> = tokenize(&sentence.to_lowercase())
            .into_iter()
            .filter(|t| t.chars().any(|c| c.is_alphanumeric()))
            .collect();

        for pair in words.windows(2) {
            if pair[0] == pair[1] {
                issues.push(format!(
                    "Repeated word in sentence {}: '{}'",
                    i + 1,
                    pair[0]
                ));
            }
        }
    }

    let words: Vec<String> = tokenize(&text.to_lowercase())
        .into_iter()
        .filter(|t| t.chars().any(|c| c.is_alphanumeric()))
        .collect();
    for pair in words.windows(2) {
        for (subject, verb, correction) in AGREEMENT_ERRORS {
            if pair[0] == *subject && pair[1] == *verb {
                issues.push(format!(
                    "Subject-verb agreement error: '{} {}' should be '{}'",
                    subject, verb, correction
                ));
            }
        }
    }

    issues
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s)\]]+").unwrap())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap())
}

fn hashtag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#[a-zA-Z0-9_]+").unwrap())
}

fn mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@[a-zA-Z0-9_]+").unwrap())
}

fn currency_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[$€£¥]\s?\d+(?:[.,]\d+)?").unwrap())
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assessor() -> QualityAssessor {
        QualityAssessor::default()
    }

    // ==================== Tokenizer Tests ====================

    #[test]
    fn test_tokenize_words_and_punctuation() {
        assert_eq!(
            tokenize("Hello, how are you?"),
            vec!["Hello", ",", "how", "are", "you", "?"]
        );
    }

    #[test]
    fn test_tokenize_unicode_words() {
        assert_eq!(
            tokenize("Hola, ¿cómo estás?"),
            vec!["Hola", ",", "¿", "cómo", "estás", "?"]
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    // ==================== Levenshtein Tests ====================

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_levenshtein_identical() {
        let a = toks(&["a", "b", "c"]);
        assert_eq!(levenshtein(&a, &a), 0);
    }

    #[test]
    fn test_levenshtein_empty_sides() {
        let a = toks(&["a", "b"]);
        assert_eq!(levenshtein(&a, &[]), 2);
        assert_eq!(levenshtein(&[], &a), 2);
    }

    #[test]
    fn test_levenshtein_substitutions_and_inserts() {
        let a = toks(&["the", "cat", "sat"]);
        let b = toks(&["the", "dog", "sat", "down"]);
        assert_eq!(levenshtein(&a, &b), 2);
    }

    #[test]
    fn test_normalized_edit_distance_scenario() {
        // hello , how are you ?  vs  hola , ¿ cómo estás ?
        // 4 substitutions over max length 6
        let distance = normalized_edit_distance("Hello, how are you?", "Hola, ¿cómo estás?");
        assert!((distance - 4.0 / 6.0).abs() < 1e-9);
    }

    // ==================== Sentence Split Tests ====================

    #[test]
    fn test_split_sentences_basic() {
        assert_eq!(
            split_sentences("One. Two! Three?"),
            vec!["One.", "Two!", "Three?"]
        );
    }

    #[test]
    fn test_split_sentences_trailing_fragment() {
        assert_eq!(
            split_sentences("Done. And more"),
            vec!["Done.", "And more"]
        );
    }

    #[test]
    fn test_split_sentences_repeated_terminators() {
        assert_eq!(split_sentences("What?! Really..."), vec!["What?!", "Really..."]);
    }

    // ==================== Structure Score Tests ====================

    #[test]
    fn test_structure_score_perfect() {
        let rules = LanguageRegistry::get().rules_or_default("en");
        assert!((sentence_structure_score("Hello there. How are you?", rules) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_structure_score_missing_capital() {
        let rules = LanguageRegistry::get().rules_or_default("en");
        assert!((sentence_structure_score("hello there.", rules) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_structure_score_missing_terminator() {
        let rules = LanguageRegistry::get().rules_or_default("en");
        assert!((sentence_structure_score("Hello there", rules) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_structure_score_no_capitalization_rule_for_japanese() {
        let rules = LanguageRegistry::get().rules_or_default("ja");
        // Lowercase start is fine; 。 is a valid terminator
        assert!((sentence_structure_score("こんにちは。", rules) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_structure_score_empty_text() {
        let rules = LanguageRegistry::get().rules_or_default("en");
        assert_eq!(sentence_structure_score("", rules), 0.0);
    }

    // ==================== Token Preservation Tests ====================

    #[test]
    fn test_token_preservation_full() {
        assert!((token_preservation("GPT runs fast", "fast GPT runs") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_token_preservation_partial() {
        // {hello, world} vs {hello, mundo}: 1 of 2 preserved
        assert!((token_preservation("hello world", "hello mundo") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_token_preservation_case_folded() {
        assert!((token_preservation("Hello", "HELLO") - 1.0).abs() < 1e-9);
    }

    // ==================== Case Pattern Tests ====================

    #[test]
    fn test_case_pattern_identical() {
        assert!((case_pattern_score("AbC", "XyZ") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_case_pattern_partial() {
        // 'a' vs 'X' disagrees, 'B' vs 'y' disagrees, 'c' vs 'z' agrees
        assert!((case_pattern_score("aBc", "Xyz") - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_case_pattern_shorter_translation_counts_against_source() {
        // Only 2 aligned positions agree out of 4 source chars
        assert!((case_pattern_score("abcd", "ab") - 0.5).abs() < 1e-9);
    }

    // ==================== Format Preservation Tests ====================

    #[test]
    fn test_url_preservation_kept() {
        let score =
            pattern_preservation(url_regex(), "see https://example.com", "ver https://example.com");
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_url_preservation_dropped() {
        let score = pattern_preservation(url_regex(), "see https://example.com", "ver el sitio");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_preservation_vacuous_when_source_has_none() {
        assert_eq!(pattern_preservation(url_regex(), "no links here", "sin enlaces"), 1.0);
        assert_eq!(pattern_preservation(tag_regex(), "plain", "plano"), 1.0);
        assert_eq!(pattern_preservation(email_regex(), "plain", "plano"), 1.0);
    }

    #[test]
    fn test_hashtag_and_mention_preservation() {
        let original = "Ask @support about #updates and #news";
        let translated = "Pregunta a @support sobre #updates";
        assert!(
            (pattern_preservation(hashtag_regex(), original, translated) - 0.5).abs() < 1e-9
        );
        assert!(
            (pattern_preservation(mention_regex(), original, translated) - 1.0).abs() < 1e-9
        );
    }

    #[test]
    fn test_number_and_currency_preservation() {
        let original = "Pay $5.99 for 3 items";
        let translated = "Paga $5.99 por 3 artículos";
        assert!((pattern_preservation(number_regex(), original, translated) - 1.0).abs() < 1e-9);
        assert!(
            (pattern_preservation(currency_regex(), original, translated) - 1.0).abs() < 1e-9
        );
    }

    #[test]
    fn test_tag_preservation_partial() {
        let original = "<b>bold</b> and <i>italic</i>";
        let translated = "<b>negrita</b> e italica";
        // Source tags: <b>, </b>, <i>, </i>; translation keeps 2 of 4
        assert!((pattern_preservation(tag_regex(), original, translated) - 0.5).abs() < 1e-9);
    }

    // ==================== Grammar Issue Tests ====================

    #[test]
    fn test_grammar_capitalization_issue() {
        let issues = grammar_issues("this is wrong.", "en");
        assert!(issues
            .iter()
            .any(|i| i.contains("Sentence 1 should start with a capital letter")));
    }

    #[test]
    fn test_grammar_repeated_word() {
        let issues = grammar_issues("The the cat sat.", "en");
        assert!(issues
            .iter()
            .any(|i| i.contains("Repeated word in sentence 1: 'the'")));
    }

    #[test]
    fn test_grammar_subject_verb_agreement() {
        let issues = grammar_issues("They is happy.", "en");
        assert!(issues
            .iter()
            .any(|i| i.contains("'they is' should be 'they are'")));
    }

    #[test]
    fn test_grammar_agreement_needs_word_boundaries() {
        // "This is" must not match the "i is" pattern
        let issues = grammar_issues("This is fine.", "en");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_grammar_skipped_for_non_english_targets() {
        assert!(grammar_issues("esto está mal escrito", "es").is_empty());
        assert!(grammar_issues("they is happy", "fr").is_empty());
    }

    #[test]
    fn test_grammar_clean_text_has_no_issues() {
        assert!(grammar_issues("Everything looks good. Nothing to report!", "en").is_empty());
    }

    // ==================== Assess: Edge Cases ====================

    #[test]
    fn test_assess_empty_original() {
        let report = assessor().assess("", "x", "en", "es");
        assert_eq!(report.score, 0.0);
        assert_eq!(report.confidence, 0.0);
        assert_eq!(report.issues, vec!["empty input".to_string()]);
    }

    #[test]
    fn test_assess_empty_translated() {
        let report = assessor().assess("x", "", "en", "es");
        assert_eq!(report.score, 0.0);
        assert_eq!(report.confidence, 0.0);
        assert!(!report.issues.is_empty());
    }

    #[test]
    fn test_assess_whitespace_only_is_empty() {
        let report = assessor().assess("   ", "x", "en", "es");
        assert_eq!(report.score, 0.0);
    }

    // ==================== Assess: Fixed Scenario ====================

    #[test]
    fn test_assess_hello_scenario_exact_score() {
        // length: 18/19 chars, in band           -> 1.0   * 0.2
        // distance: 1 - 4/6                      -> 1/3   * 0.3
        // structure: capitalized, ends with '?'  -> 1.0   * 0.3
        // preservation: {",", "?"} of 6 tokens   -> 1/3   * 0.2
        let report = assessor().assess("Hello, how are you?", "Hola, ¿cómo estás?", "en", "es");

        assert!(report.issues.is_empty());
        assert!(
            (report.score - 2.0 / 3.0).abs() < 1e-9,
            "score was {}",
            report.score
        );
        // Edit distance 2/3 exceeds 0.3, so confidence takes one 0.8 penalty
        assert!(
            (report.confidence - (2.0 / 3.0) * 0.8).abs() < 1e-9,
            "confidence was {}",
            report.confidence
        );
    }

    #[test]
    fn test_assess_reports_all_submetrics() {
        let report = assessor().assess("Hello world.", "Hola mundo.", "en", "es");
        for key in [
            "length_fitness",
            "lexical_similarity",
            "sentence_structure",
            "token_preservation",
            "case_pattern",
            "tag_preservation",
            "url_preservation",
            "email_preservation",
            "hashtag_preservation",
            "mention_preservation",
            "currency_preservation",
            "number_preservation",
        ] {
            let value = report.metrics.get(key).copied();
            assert!(value.is_some(), "missing metric {}", key);
            let value = value.unwrap();
            assert!((0.0..=1.0).contains(&value), "{} out of range: {}", key, value);
        }
    }

    // ==================== Assess: Penalties ====================

    #[test]
    fn test_assess_length_out_of_band_adds_issue_and_penalty() {
        let report = assessor().assess("A fairly long source sentence here.", "Si.", "en", "es");
        assert!(report
            .issues
            .iter()
            .any(|i| i.contains("Translation too short")));
        assert!((report.metrics["length_fitness"] - 0.5).abs() < 1e-9);
        assert!(report.confidence < report.score);
    }

    #[test]
    fn test_assess_too_long_translation() {
        let report = assessor().assess(
            "Hi.",
            "This translation is far far longer than its source text.",
            "en",
            "en",
        );
        assert!(report
            .issues
            .iter()
            .any(|i| i.contains("Translation too long")));
    }

    #[test]
    fn test_assess_grammar_issues_reduce_score_for_english_target() {
        let clean = assessor().assess("Hola mundo grande.", "Big wide world.", "es", "en");
        let flawed = assessor().assess("Hola mundo grande.", "big big world.", "es", "en");
        assert!(!flawed.issues.is_empty());
        assert!(flawed.score < clean.score);
    }

    #[test]
    fn test_assess_identical_text_scores_high() {
        let report = assessor().assess("The answer is 42.", "The answer is 42.", "en", "en");
        assert!(report.score > 0.95, "score was {}", report.score);
        assert!(report.issues.is_empty());
    }

    // ==================== Stored-Score Reports ====================

    #[test]
    fn test_from_stored_uses_known_good_confidence() {
        let report = QualityReport::from_stored(0.75);
        assert_eq!(report.score, 0.75);
        assert_eq!(report.confidence, KNOWN_GOOD_CONFIDENCE);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_zeroed_report() {
        let report = QualityReport::zeroed("broken");
        assert_eq!(report.score, 0.0);
        assert_eq!(report.confidence, 0.0);
        assert_eq!(report.issues, vec!["broken".to_string()]);
    }
}
