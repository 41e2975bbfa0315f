//! Text-index tokenizer

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Per-index text options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextOptions {
    /// Split characters; empty means the engine default
    #[serde(default)]
    pub delimiters: String,
    #[serde(default)]
    pub remove_stopwords: bool,
}

/// Lower-cased, trimmed tokens of `text` with their word positions.
///
/// Positions count every non-empty token, so they stay stable whether or
/// not stopwords are removed afterwards.
pub fn tokenize<'a>(text: &'a str, delimiters: &'a str) -> impl Iterator<Item = (u32, String)> + 'a {
    text.split(move |c: char| {
        if delimiters.is_empty() {
            c.is_whitespace()
        } else {
            delimiters.contains(c)
        }
    })
    .map(|t| t.trim().to_lowercase())
    .filter(|t| !t.is_empty())
    .enumerate()
    .map(|(pos, t)| (pos as u32, t))
}

/// Case-insensitive stopword set
#[derive(Debug, Clone, Default)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }
}
