// WHY: standalone stripping pass so it can be tested apart from protection/restoration
// Removes stray punctuation sandwiched between two word characters ("exa,ple" -> "exaple")

use super::PunctuationSet;

/// Word character as used by the stripper: Unicode alphanumeric or underscore
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Remove mid-word punctuation with a new allocation
pub fn strip_mid_word_punctuation(text: &str, set: PunctuationSet) -> String {
    let mut result = String::with_capacity(text.len());
    strip_mid_word_punctuation_into(text, set, &mut result);
    result
}

/// Remove mid-word punctuation into supplied buffer
/// Neighbours are always read from the input, so "a,b,c" loses both commas
pub fn strip_mid_word_punctuation_into(text: &str, set: PunctuationSet, buffer: &mut String) {
    buffer.clear();
    buffer.reserve(text.len());

    let mut prev: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        let sandwiched = set.contains(ch)
            && prev.is_some_and(is_word_char)
            && chars.peek().copied().is_some_and(is_word_char);

        if !sandwiched {
            buffer.push(ch);
        }
        prev = Some(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_basic_mid_word() {
        assert_eq!(strip_mid_word_punctuation("exa,ple", PunctuationSet::Standard), "exaple");
        assert_eq!(strip_mid_word_punctuation("he.llo wor;ld", PunctuationSet::Standard), "hello world");
    }

    #[test]
    fn test_strip_leaves_boundary_punctuation() {
        let input = "Hello, world. Is it done? Yes!";
        assert_eq!(strip_mid_word_punctuation(input, PunctuationSet::Standard), input);
        assert_eq!(strip_mid_word_punctuation(",start end.", PunctuationSet::Standard), ",start end.");
    }

    #[test]
    fn test_strip_uses_original_neighbours() {
        // Each comma sits between word chars in the input
        assert_eq!(strip_mid_word_punctuation("a,b,c", PunctuationSet::Standard), "abc");
        // Double punctuation: neither char has word chars on both sides
        assert_eq!(strip_mid_word_punctuation("a,.b", PunctuationSet::Standard), "a,.b");
    }

    #[test]
    fn test_strip_standard_keeps_hyphen_apostrophe_slash() {
        let input = "well-known don't either/or back\\slash";
        assert_eq!(strip_mid_word_punctuation(input, PunctuationSet::Standard), input);
    }

    #[test]
    fn test_strip_extended_set() {
        let input = "well-known don't either/or back\\slash";
        assert_eq!(
            strip_mid_word_punctuation(input, PunctuationSet::Extended),
            "wellknown dont eitheror backslash"
        );
    }

    #[test]
    fn test_strip_unicode_word_chars() {
        assert_eq!(strip_mid_word_punctuation("caf.é naï,ve", PunctuationSet::Standard), "café naïve");
        assert_eq!(strip_mid_word_punctuation("数,字", PunctuationSet::Standard), "数字");
    }

    #[test]
    fn test_strip_underscore_counts_as_word() {
        assert_eq!(strip_mid_word_punctuation("x.__TOKEN0__", PunctuationSet::Standard), "x__TOKEN0__");
    }

    #[test]
    fn test_strip_into_buffer_reuse() {
        let mut buffer = String::new();
        strip_mid_word_punctuation_into("on:e", PunctuationSet::Standard, &mut buffer);
        assert_eq!(buffer, "one");
        strip_mid_word_punctuation_into("tw!o", PunctuationSet::Standard, &mut buffer);
        assert_eq!(buffer, "two");
    }

    #[test]
    fn test_strip_empty() {
        assert_eq!(strip_mid_word_punctuation("", PunctuationSet::Standard), "");
    }
}
