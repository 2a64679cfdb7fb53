//! Lexical similarity toolkit.
//!
//! Pure string functions used by the matching engine: accent-agnostic
//! normalization, Levenshtein edit distance, a normalized similarity ratio,
//! and a Soundex-style phonetic code.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Length of a phonetic code, including the leading letter.
pub const PHONETIC_CODE_LEN: usize = 4;

/// Anything that is neither a word character nor whitespace.
static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"));

/// Normalize text for accent-agnostic comparison.
///
/// Lowercases, decomposes (NFD) and drops combining diacritical marks, strips
/// punctuation and symbols, then trims. Empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    let folded: String = text.to_lowercase().nfd().filter(|c| !is_combining_diacritic(*c)).collect();
    PUNCTUATION.replace_all(&folded, "").trim().to_string()
}

/// Combining Diacritical Marks block (U+0300..U+036F).
fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// Calculate the Levenshtein distance between two strings (unit costs).
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut dp = vec![vec![0; b.len() + 1]; a.len() + 1];

    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        dp[0][j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1).min(dp[i][j - 1] + 1).min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[a.len()][b.len()]
}

/// Similarity ratio in `[0, 1]`: `1 - distance / len(longer)`.
///
/// Two empty strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let (a_len, b_len) = (a.chars().count(), b.chars().count());
    let (longer, shorter, longer_len) = if a_len >= b_len { (a, b, a_len) } else { (b, a, b_len) };

    if longer_len == 0 {
        return 1.0;
    }

    let distance = edit_distance(longer, shorter);
    (longer_len - distance) as f64 / longer_len as f64
}

/// Consonant class digit for a lowercase letter, `None` for vowels,
/// `h`, `w`, `y` and anything outside the table.
fn consonant_class(c: char) -> Option<char> {
    match c {
        'b' | 'f' | 'p' | 'v' => Some('1'),
        'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
        'd' | 't' => Some('3'),
        'l' => Some('4'),
        'm' | 'n' => Some('5'),
        'r' => Some('6'),
        _ => None,
    }
}

/// Compute the 4-character phonetic code of a word.
///
/// The first letter is kept (uppercased). Each following letter is mapped to
/// its consonant class; runs of identical entries collapse before uncoded
/// letters are dropped, so a vowel between two identical consonants keeps
/// both. The result is zero-padded and truncated to 4 characters.
///
/// # Examples
/// `Robert` and `Rupert` both code to `R163`.
pub fn phonetic_code(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();

    let mut code = String::with_capacity(PHONETIC_CODE_LEN);
    if let Some(first) = chars.next() {
        code.extend(first.to_uppercase().take(1));
    }

    let mut previous: Option<Option<char>> = None;
    for c in chars {
        if code.chars().count() >= PHONETIC_CODE_LEN {
            break;
        }
        let class = consonant_class(c);
        if previous == Some(class) {
            continue;
        }
        previous = Some(class);
        if let Some(digit) = class {
            code.push(digit);
        }
    }

    while code.chars().count() < PHONETIC_CODE_LEN {
        code.push('0');
    }
    code
}

/// Two words sound alike when their phonetic codes are identical.
pub fn phonetic_match(a: &str, b: &str) -> bool {
    phonetic_code(a) == phonetic_code(b)
}
