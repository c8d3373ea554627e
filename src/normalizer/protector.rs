// WHY: span protection keeps quoted strings, paths and caller terms out of reach of the stripper
// Each protected span is swapped for an opaque word-character token indexed into a SpanTable

use aho_corasick::AhoCorasick;
use regex_automata::meta::Regex;

use super::stripper::is_word_char;
use super::PunctuationSet;

/// First placeholder stem tried for every call
pub const PLACEHOLDER_PREFIX: &str = "__PROTECTED";
/// Terminator written after the index digits
pub const PLACEHOLDER_SUFFIX: &str = "__";

/// Quoted string with backslash escapes, single line, same delimiter on both ends
pub const QUOTE_PATTERN: &str = r#""(?:\\[^\n]|[^"\\\n])*"|'(?:\\[^\n]|[^'\\\n])*'"#;
/// Drive-letter or separator-led path running up to whitespace or a quote
pub const PATH_PATTERN: &str = r#"[A-Za-z]:[\\/][^\s"']+|[\\/][^\s"']+"#;

/// What a protected span was recognised as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Quote,
    Path,
    Term,
}

/// One span lifted out of the working text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    /// Exact original substring, delimiters included for quotes
    pub original: String,
}

impl Span {
    /// Split a quote span into (opening delimiter, interior, closing delimiter)
    pub fn quote_parts(&self) -> Option<(char, &str, char)> {
        if self.kind != SpanKind::Quote {
            return None;
        }
        let mut chars = self.original.chars();
        let open = chars.next()?;
        let close = chars.next_back()?;
        Some((open, chars.as_str(), close))
    }
}

/// Insertion-ordered spans for a single pipeline run
/// Indices start at 0, grow monotonically and are never reused
#[derive(Debug)]
pub struct SpanTable {
    stem: String,
    spans: Vec<Span>,
}

impl SpanTable {
    pub fn new(stem: String) -> Self {
        Self { stem, spans: Vec::new() }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Record a span and return the token that stands in for it
    pub fn push(&mut self, kind: SpanKind, original: &str) -> String {
        let index = self.spans.len();
        self.spans.push(Span {
            kind,
            original: original.to_string(),
        });
        self.placeholder(index)
    }

    pub fn placeholder(&self, index: usize) -> String {
        format!("{}{}{}", self.stem, index, PLACEHOLDER_SUFFIX)
    }

    pub fn get(&self, index: usize) -> Option<&Span> {
        self.spans.get(index)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }
}

/// Pick a placeholder stem that cannot collide with anything in this call
///
/// The stem must be absent from the input even after every strippable
/// punctuation char is removed, otherwise stripping could assemble a fake
/// token. Terms are checked too since a term match is stored verbatim.
pub fn choose_stem(text: &str, set: PunctuationSet, terms: &[String]) -> String {
    let squeezed: String = text.chars().filter(|ch| !set.contains(*ch)).collect();
    let collides = |stem: &str| squeezed.contains(stem) || terms.iter().any(|term| term.contains(stem));

    if !collides(PLACEHOLDER_PREFIX) {
        return PLACEHOLDER_PREFIX.to_string();
    }

    let mut attempt = 1usize;
    loop {
        let stem = format!("{PLACEHOLDER_PREFIX}{attempt}x");
        if !collides(&stem) {
            return stem;
        }
        attempt += 1;
    }
}

/// Replace every non-overlapping match of `pattern`, left to right
pub fn protect_matches(text: &str, pattern: &Regex, kind: SpanKind, table: &mut SpanTable) -> String {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for found in pattern.find_iter(text) {
        output.push_str(&text[last..found.start()]);
        output.push_str(&table.push(kind, &text[found.range()]));
        last = found.end();
    }

    output.push_str(&text[last..]);
    output
}

/// Replace caller-supplied terms that stand as whole words
pub fn protect_terms(text: &str, matcher: &AhoCorasick, table: &mut SpanTable) -> String {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for found in matcher.find_iter(text) {
        let before = text[..found.start()].chars().next_back();
        let after = text[found.end()..].chars().next();
        if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
            continue;
        }

        output.push_str(&text[last..found.start()]);
        output.push_str(&table.push(SpanKind::Term, &text[found.range()]));
        last = found.end();
    }

    output.push_str(&text[last..]);
    output
}
