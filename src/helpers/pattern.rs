//! Three word address pattern matching.
//!
//! The separator set (dot plus its CJK, Khmer, Armenian, Myanmar, Urdu,
//! Ethiopic and Devanagari equivalents) is part of the address format and must
//! match the server's exactly.

use once_cell::sync::Lazy;
use regex::Regex;

/// Word separators accepted inside a strict three word address.
const SEPARATORS: &str = ".｡。･・︒។։။۔።।";

/// Looser delimiters accepted by the did-you-mean pattern: separators plus
/// whitespace, the ideographic space and common punctuation.
const LOOSE_DELIMITERS: &str = r".｡。･・︒។։။۔።। ,\\\^_/+'&:;|　\-";

/// A word: one or more letters, each with any trailing combining marks.
const WORD: &str = r"(?:\p{L}\p{M}*)+";

static POSSIBLE_3WA: Lazy<Regex> = Lazy::new(|| {
    // Either three single words, or (for languages with spaces inside a word)
    // three groups of 2-4 space-separated words.
    let multi = format!(r"{w}(?:[\x20\xA0]{w}){{1,3}}", w = WORD);
    let pattern = format!(
        r"^/*(?:{w}[{s}]{w}[{s}]{w}|{m}[{s}]{m}[{s}]{m})$",
        w = WORD,
        m = multi,
        s = SEPARATORS
    );
    Regex::new(&pattern).expect("three word address pattern is valid")
});

static DID_YOU_MEAN_3WA: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"^/*{w}[{d}]{{1,2}}{w}[{d}]{{1,2}}{w}$",
        w = WORD,
        d = LOOSE_DELIMITERS
    );
    Regex::new(&pattern).expect("did-you-mean pattern is valid")
});

static SEARCH_3WA: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r"{w}[{s}]{w}[{s}]{w}", w = WORD, s = SEPARATORS);
    Regex::new(&pattern).expect("search pattern is valid")
});

static LOOSE_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("[{}]+", LOOSE_DELIMITERS)).expect("delimiter pattern is valid")
});

/// Whether `text` has the shape of a three word address, e.g.
/// `filled.count.soap` or `///filled.count.soap`.
///
/// This is a syntax check only; use `TextDataSource::is_valid_3wa` to ask the
/// server whether the address exists.
pub fn is_possible_3wa(text: &str) -> bool {
    POSSIBLE_3WA.is_match(text)
}

/// Whether `text` is three words joined by looser delimiters, such as
/// `filled count soap` or `filled-count-soap`.
pub fn did_you_mean_3wa(text: &str) -> bool {
    DID_YOU_MEAN_3WA.is_match(text)
}

/// Every substring of free text that looks like a three word address.
pub fn search_possible_3wa(text: &str) -> Vec<String> {
    SEARCH_3WA
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Rewrite loosely delimited input as `word.word.word`, keeping at most the
/// first three words.
pub fn reformat_3wa(text: &str) -> String {
    LOOSE_SPLIT
        .split(text.trim_start_matches('/'))
        .filter(|token| !token.is_empty())
        .take(3)
        .collect::<Vec<_>>()
        .join(".")
}
