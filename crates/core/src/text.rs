//! Natural-language capabilities used by ranking and sentence extraction.
//!
//! [`TextAnalyzer`] is passed explicitly to the components that need it;
//! nothing here is global. [`EnglishAnalyzer`] is a rule-based
//! implementation: word tokens, suffix-rule lemmas, punctuation-driven
//! sentence boundaries and a fixed stopword list.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

use crate::stopwords::ENGLISH_STOPWORDS;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("cannot read stopword file '{path}': {source}")]
    Stopwords {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub trait TextAnalyzer {
    /// Word tokens in reading order, original case.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Lowercase dictionary form of a single token.
    fn lemmatize(&self, token: &str) -> String;

    /// Sentence slices of `text`, trimmed, in order.
    fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str>;

    fn is_stopword(&self, token: &str) -> bool;

    /// Lemmas of the alphabetic, non-stopword tokens of `text`.
    fn keywords(&self, text: &str) -> HashSet<String> {
        self.tokenize(text)
            .into_iter()
            .filter(|t| t.chars().all(char::is_alphabetic))
            .filter(|t| !self.is_stopword(t))
            .map(|t| self.lemmatize(&t))
            .collect()
    }

    /// Lowercase terms for vectorization: two characters or more, no stopwords.
    fn terms(&self, text: &str) -> Vec<String> {
        self.tokenize(text)
            .into_iter()
            .map(|t| t.to_lowercase())
            .filter(|t| t.chars().count() >= 2 && !self.is_stopword(t))
            .collect()
    }
}

/// Abbreviations whose trailing period does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "vs", "mr", "mrs", "ms", "dr", "prof", "st", "no", "fig", "approx",
    "inc", "ltd", "jr", "sr", "dept", "est", "vol",
];

const IRREGULAR_LEMMAS: &[(&str, &str)] = &[
    ("children", "child"),
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("went", "go"),
    ("ran", "run"),
    ("did", "do"),
    ("made", "make"),
    ("making", "make"),
    ("took", "take"),
    ("taken", "take"),
    ("taking", "take"),
    ("gave", "give"),
    ("given", "give"),
    ("wrote", "write"),
    ("written", "write"),
    ("found", "find"),
    ("was", "be"),
    ("were", "be"),
    ("is", "be"),
    ("are", "be"),
    ("been", "be"),
    ("has", "have"),
    ("had", "have"),
];

pub struct EnglishAnalyzer {
    token_re: Regex,
    stopwords: HashSet<String>,
    irregular: HashMap<&'static str, &'static str>,
}

impl EnglishAnalyzer {
    pub fn new() -> Result<Self, AnalyzerError> {
        Ok(EnglishAnalyzer {
            token_re: Regex::new(r"\w+")?,
            stopwords: ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            irregular: IRREGULAR_LEMMAS.iter().copied().collect(),
        })
    }

    /// Add one stopword per line from `path`; blank lines and `#` comments
    /// are ignored.
    pub fn with_extra_stopwords(mut self, path: &Path) -> Result<Self, AnalyzerError> {
        let content = std::fs::read_to_string(path).map_err(|source| AnalyzerError::Stopwords {
            path: path.to_path_buf(),
            source,
        })?;
        let before = self.stopwords.len();
        self.stopwords.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_lowercase),
        );
        log::debug!(
            "loaded {} extra stopword(s) from {}",
            self.stopwords.len() - before,
            path.display()
        );
        Ok(self)
    }

    fn is_abbreviation(word: &str) -> bool {
        let w = word
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        // Single letters are initials.
        w.chars().count() == 1 || ABBREVIATIONS.contains(&w.as_str())
    }
}

fn is_closing(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '"' | '\'' | ')' | ']' | '\u{201D}')
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Strip a verb suffix, undoubling a final consonant ("planned" -> "plan")
/// or restoring a silent "e" on short stems ("baked" -> "bake").
fn strip_verb_suffix(word: &str, suffix: &str) -> String {
    let stem: Vec<char> = word[..word.len() - suffix.len()].chars().collect();
    let n = stem.len();

    let last = stem.last().copied().unwrap_or(' ');
    if n >= 3 && last == stem[n - 2] && !is_vowel(last) && !matches!(last, 'l' | 's' | 'z') {
        return stem[..n - 1].iter().collect();
    }

    let short_cvc = n == 3
        && !is_vowel(stem[0])
        && is_vowel(stem[1])
        && !is_vowel(last)
        && !matches!(last, 'w' | 'x' | 'y');
    if short_cvc {
        let mut s: String = stem.iter().collect();
        s.push('e');
        return s;
    }

    stem.iter().collect()
}

impl TextAnalyzer for EnglishAnalyzer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        self.token_re
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn lemmatize(&self, token: &str) -> String {
        let word = token.to_lowercase();
        if let Some(lemma) = self.irregular.get(word.as_str()) {
            return lemma.to_string();
        }

        let len = word.chars().count();
        if len <= 3 || !word.is_ascii() {
            return word;
        }

        if word.ends_with("ies") && len > 4 {
            return format!("{}y", &word[..word.len() - 3]);
        }
        if word.ends_with("sses") {
            return word[..word.len() - 2].to_string();
        }
        if ["xes", "ches", "shes", "zes"].iter().any(|s| word.ends_with(s)) {
            return word[..word.len() - 2].to_string();
        }
        if word.ends_with("oes") && len > 5 {
            return word[..word.len() - 2].to_string();
        }
        if word.ends_with('s') && !["ss", "us", "is"].iter().any(|s| word.ends_with(s)) {
            return word[..word.len() - 1].to_string();
        }
        if word.ends_with("ing") && len > 5 {
            return strip_verb_suffix(&word, "ing");
        }
        if word.ends_with("ed") && !word.ends_with("eed") && len > 4 {
            return strip_verb_suffix(&word, "ed");
        }

        word
    }

    fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut start = 0;
        let chars: Vec<(usize, char)> = text.char_indices().collect();

        for (i, &(pos, c)) in chars.iter().enumerate() {
            if !matches!(c, '.' | '!' | '?') {
                continue;
            }

            // Absorb trailing terminators and closing quotes/brackets.
            let mut j = i + 1;
            while j < chars.len() && is_closing(chars[j].1) {
                j += 1;
            }
            if j < chars.len() && !chars[j].1.is_whitespace() {
                continue;
            }
            // Only the first terminator of a run splits.
            if i > 0 && matches!(chars[i - 1].1, '.' | '!' | '?') {
                continue;
            }

            let end = chars.get(j).map(|&(p, _)| p).unwrap_or(text.len());

            let mut k = j;
            while k < chars.len() && chars[k].1.is_whitespace() {
                k += 1;
            }
            if k < chars.len() {
                let next = chars[k].1;
                let starts_sentence = next.is_uppercase()
                    || next.is_ascii_digit()
                    || matches!(next, '"' | '\'' | '(' | '[' | '\u{201C}' | '\u{2022}');
                if !starts_sentence {
                    continue;
                }
            }

            if c == '.' {
                let word = text[start..pos].split_whitespace().last().unwrap_or("");
                if Self::is_abbreviation(word) {
                    continue;
                }
            }

            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = end;
        }

        let rest = text[start..].trim();
        if !rest.is_empty() {
            out.push(rest);
        }
        out
    }

    fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(&token.to_lowercase())
    }
}
