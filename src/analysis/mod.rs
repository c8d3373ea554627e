// WHY: lightweight keyword and extractive-summary helpers for pasted teaching material
// Regex sentence boundaries plus frequency counting; no models, no external data

use anyhow::Result;
use regex_automata::meta::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub mod stopwords;

pub use stopwords::STOPWORDS;

use crate::normalizer::is_word_char;

/// Sentence end punctuation, whitespace, then a capital letter
pub const SENTENCE_BOUNDARY_PATTERN: &str = r"[.!?]\s+[A-Z]";

/// Keywords and summary for one piece of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextAnalysis {
    pub summary: String,
    pub keywords: Vec<String>,
}

/// Lowercased maximal runs of word characters
pub fn word_tokens(text: &str) -> Vec<String> {
    text.split(|ch: char| !is_word_char(ch))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Keyword and summary extractor with a compiled boundary pattern
pub struct TextAnalyzer {
    sentence_boundary: Regex,
    stopwords: HashSet<&'static str>,
}

impl TextAnalyzer {
    pub fn new() -> Result<Self> {
        let sentence_boundary = Regex::new(SENTENCE_BOUNDARY_PATTERN)?;
        Ok(Self {
            sentence_boundary,
            stopwords: STOPWORDS.iter().copied().collect(),
        })
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// Split on `[.!?]` + whitespace + capital; pieces are trimmed and empties dropped
    pub fn split_sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let text = text.trim();
        let mut sentences = Vec::new();
        let mut start = 0;

        for boundary in self.sentence_boundary.find_iter(text) {
            // punctuation and capital are both single-byte ASCII
            let piece = text[start..boundary.start() + 1].trim();
            if !piece.is_empty() {
                sentences.push(piece);
            }
            start = boundary.end() - 1;
        }

        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail);
        }
        sentences
    }

    /// Most frequent non-stopword tokens longer than two characters
    /// Ties keep the order in which words first appear
    pub fn extract_keywords(&self, text: &str, limit: usize) -> Vec<String> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for token in word_tokens(text) {
            if token.chars().count() <= 2 || self.is_stopword(&token) {
                continue;
            }
            match positions.get(&token) {
                Some(&position) => counts[position].1 += 1,
                None => {
                    positions.insert(token.clone(), counts.len());
                    counts.push((token, 1));
                }
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.into_iter().take(limit).map(|(word, _)| word).collect()
    }

    /// Pick the `limit` highest-scoring sentences, joined in rank order
    ///
    /// A sentence scores the sum of document frequencies of its non-stopword
    /// tokens; equal scores keep document order.
    pub fn summarize(&self, text: &str, limit: usize) -> String {
        let mut frequency: HashMap<String, usize> = HashMap::new();
        for token in word_tokens(text) {
            if !self.is_stopword(&token) {
                *frequency.entry(token).or_insert(0) += 1;
            }
        }

        let sentences = self.split_sentences(text);
        let mut scored: Vec<(usize, &str)> = sentences
            .iter()
            .map(|sentence| {
                let score: usize = word_tokens(sentence)
                    .iter()
                    .filter_map(|token| frequency.get(token))
                    .sum();
                (score, *sentence)
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        debug!("Scored {} sentences for summary", scored.len());

        scored
            .into_iter()
            .take(limit)
            .map(|(_, sentence)| sentence)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn analyze(&self, text: &str, keyword_limit: usize, sentence_limit: usize) -> TextAnalysis {
        TextAnalysis {
            summary: self.summarize(text, sentence_limit),
            keywords: self.extract_keywords(text, keyword_limit),
        }
    }
}
