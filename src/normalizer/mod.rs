// WHY: single entry point that composes protect -> strip -> restore
// Quoted strings are cleaned recursively inside their delimiters, paths and terms are never rewritten

use anyhow::{Context, Result};
use aho_corasick::{AhoCorasick, MatchKind};
use regex_automata::meta::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, trace};

pub(crate) mod protector;
pub(crate) mod restorer;
pub mod stripper;

use protector::{SpanKind, SpanTable, PATH_PATTERN, QUOTE_PATTERN};

pub use protector::{PLACEHOLDER_PREFIX, PLACEHOLDER_SUFFIX};
pub use stripper::{is_word_char, strip_mid_word_punctuation, strip_mid_word_punctuation_into};

/// Punctuation removed when it sits between two word characters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PunctuationSet {
    /// `, . ; : ! ?`
    #[default]
    Standard,
    /// Standard plus `- ' \ /`, which also joins hyphenated words and contractions
    Extended,
}

const STANDARD_PUNCTUATION: &[char] = &[',', '.', ';', ':', '!', '?'];
const EXTENDED_PUNCTUATION: &[char] = &[',', '.', ';', ':', '!', '?', '-', '\'', '\\', '/'];

impl PunctuationSet {
    pub fn chars(self) -> &'static [char] {
        match self {
            PunctuationSet::Standard => STANDARD_PUNCTUATION,
            PunctuationSet::Extended => EXTENDED_PUNCTUATION,
        }
    }

    pub fn contains(self, ch: char) -> bool {
        self.chars().contains(&ch)
    }
}

/// Normalizer settings, usually read from the `[normalizer]` table of the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub punctuation: PunctuationSet,
    /// How many levels of quote interiors get cleaned; 0 restores quotes verbatim
    pub max_quote_depth: usize,
    /// Literal terms protected as whole words (names, product spellings)
    pub protected_terms: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            punctuation: PunctuationSet::Standard,
            max_quote_depth: 8,
            protected_terms: Vec::new(),
        }
    }
}

/// Placeholder-protecting text normalizer
///
/// Holds only compiled, immutable matchers, so one instance can be shared
/// across threads; every call builds its own span table.
#[derive(Debug)]
pub struct Normalizer {
    config: NormalizerConfig,
    quote_pattern: Regex,
    path_pattern: Regex,
    terms: Vec<String>,
    term_matcher: Option<AhoCorasick>,
}

impl Normalizer {
    /// Build a normalizer, compiling the quote/path patterns and the term matcher
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        let quote_pattern = Regex::new(QUOTE_PATTERN).context("Failed to compile quote pattern")?;
        let path_pattern = Regex::new(PATH_PATTERN).context("Failed to compile path pattern")?;

        let terms: Vec<String> = config
            .protected_terms
            .iter()
            .map(|term| term.trim())
            .filter(|term| !term.is_empty())
            .map(str::to_string)
            .collect();

        let term_matcher = if terms.is_empty() {
            None
        } else {
            let matcher = AhoCorasick::builder()
                .match_kind(MatchKind::LeftmostLongest)
                .build(&terms)
                .context("Failed to build protected term matcher")?;
            Some(matcher)
        };

        debug!(
            punctuation = ?config.punctuation,
            max_quote_depth = config.max_quote_depth,
            protected_terms = terms.len(),
            "Built normalizer"
        );

        Ok(Self {
            config,
            quote_pattern,
            path_pattern,
            terms,
            term_matcher,
        })
    }

    /// Normalizer with the standard punctuation set and no protected terms
    pub fn with_defaults() -> Result<Self> {
        Self::new(NormalizerConfig::default())
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Clean `text`, returning a new string
    pub fn normalize(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        self.normalize_at(text, 0, &mut output);
        output
    }

    /// Clean `text` into a caller-owned buffer
    ///
    /// The restored output, quote interiors included, is written straight
    /// into `buffer`; only the intermediate protected and stripped passes
    /// allocate.
    pub fn normalize_into(&self, text: &str, buffer: &mut String) {
        buffer.clear();
        buffer.reserve(text.len());
        self.normalize_at(text, 0, buffer);
    }

    fn normalize_at(&self, text: &str, depth: usize, output: &mut String) {
        if text.is_empty() {
            return;
        }

        let stem = protector::choose_stem(text, self.config.punctuation, &self.terms);
        let mut table = SpanTable::new(stem);

        let quoted = protector::protect_matches(text, &self.quote_pattern, SpanKind::Quote, &mut table);
        let quote_count = table.len();
        let pathed = protector::protect_matches(&quoted, &self.path_pattern, SpanKind::Path, &mut table);
        let path_count = table.len() - quote_count;
        let protected = match &self.term_matcher {
            Some(matcher) => protector::protect_terms(&pathed, matcher, &mut table),
            None => pathed,
        };

        let stripped = strip_mid_word_punctuation(&protected, self.config.punctuation);

        trace!(
            depth,
            quotes = quote_count,
            paths = path_count,
            terms = table.len() - quote_count - path_count,
            stripped = protected.len() - stripped.len(),
            "Normalized pass"
        );

        restorer::restore_into(&stripped, &table, output, |index, span, out| match span.kind {
            SpanKind::Quote => self.restore_quote(span, depth, out),
            SpanKind::Path | SpanKind::Term => restorer::resolve_verbatim_into(&span.original, &table, index, out),
        });
    }

    fn restore_quote(&self, span: &protector::Span, depth: usize, output: &mut String) {
        if depth >= self.config.max_quote_depth {
            output.push_str(&span.original);
            return;
        }
        let Some((open, interior, close)) = span.quote_parts() else {
            output.push_str(&span.original);
            return;
        };

        output.push(open);
        self.normalize_at(interior, depth + 1, output);
        output.push(close);
    }
}

static DEFAULT_NORMALIZER: OnceLock<Normalizer> = OnceLock::new();

/// Clean `text` with the default configuration
///
/// Pure and deterministic; the underlying normalizer is built once per process.
pub fn normalize(text: &str) -> String {
    DEFAULT_NORMALIZER
        .get_or_init(|| Normalizer::with_defaults().expect("built-in normalizer patterns compile"))
        .normalize(text)
}
