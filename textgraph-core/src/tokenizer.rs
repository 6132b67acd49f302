//! Word tokenizer for paragraph and query text.
//!
//! Text is lowercased, every character that is neither an ASCII word
//! character (`[a-z0-9_]`) nor whitespace is removed, and the remainder is
//! split on whitespace runs. Removal happens before splitting, so
//! `"don't"` becomes the single token `"dont"`.

/// A query token together with its position in the query sequence.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Token {
    pub text: String,
    pub position: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split `text` into an ordered list of lowercase word tokens.
///
/// Empty or punctuation-only input yields an empty list.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| is_word_char(*c) || c.is_whitespace())
        .collect();

    cleaned.split_whitespace().map(String::from).collect()
}

/// Tokenize and attach positions.
pub fn tokenize_positioned(text: &str) -> Vec<Token> {
    tokenize(text)
        .into_iter()
        .enumerate()
        .map(|(position, text)| Token { text, position })
        .collect()
}
