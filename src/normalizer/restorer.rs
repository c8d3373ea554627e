// WHY: restoration is kept apart from protection so the expansion rule can be swapped per span kind
// Quote expansion (recursive cleaning) lives in the pipeline; this module only finds and resolves tokens

use super::protector::{Span, SpanTable, PLACEHOLDER_SUFFIX};

/// Parse a token at the start of `rest`, returning (index, token length in bytes)
pub fn parse_placeholder(rest: &str, stem: &str) -> Option<(usize, usize)> {
    let after_stem = rest.strip_prefix(stem)?;
    let digits = after_stem.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    let index = after_stem[..digits].parse::<usize>().ok()?;
    after_stem[digits..].strip_prefix(PLACEHOLDER_SUFFIX)?;
    Some((index, stem.len() + digits + PLACEHOLDER_SUFFIX.len()))
}

/// Replace every token in `text`, appending the result to `output`
///
/// Scanning is left to right and a replaced token is consumed whole, so the
/// trailing underscores of one token can never start another. A stem that is
/// not followed by digits and the suffix, or whose index has no table entry,
/// is passed through unchanged. `expand` writes the span's replacement.
pub fn restore_into<F>(text: &str, table: &SpanTable, output: &mut String, mut expand: F)
where
    F: FnMut(usize, &Span, &mut String),
{
    let stem = table.stem();
    output.reserve(text.len());
    let mut rest = text;

    while let Some(position) = rest.find(stem) {
        output.push_str(&rest[..position]);
        let candidate = &rest[position..];

        let resolved = parse_placeholder(candidate, stem)
            .and_then(|(index, length)| table.get(index).map(|span| (index, span, length)));

        match resolved {
            Some((index, span, length)) => {
                expand(index, span, output);
                rest = &candidate[length..];
            }
            None => {
                // stem always starts with an ASCII underscore
                output.push_str(&candidate[..1]);
                rest = &candidate[1..];
            }
        }
    }

    output.push_str(rest);
}

/// Restore a span's text exactly as captured
///
/// A span may have swallowed tokens created before it (a path running into a
/// quoted string); those are resolved to their own verbatim text. Only
/// indices below `bound` are expanded, which keeps the recursion finite.
pub fn resolve_verbatim_into(text: &str, table: &SpanTable, bound: usize, output: &mut String) {
    restore_into(text, table, output, |index, span, out| {
        if index < bound {
            resolve_verbatim_into(&span.original, table, index, out);
        } else {
            out.push_str(&table.placeholder(index));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::protector::{SpanKind, PLACEHOLDER_PREFIX};

    fn table_with(spans: &[(SpanKind, &str)]) -> SpanTable {
        let mut table = SpanTable::new(PLACEHOLDER_PREFIX.to_string());
        for (kind, original) in spans {
            table.push(*kind, original);
        }
        table
    }

    fn restore_originals(text: &str, table: &SpanTable) -> String {
        let mut output = String::new();
        restore_into(text, table, &mut output, |_, span, out| out.push_str(&span.original));
        output
    }

    #[test]
    fn test_parse_placeholder() {
        assert_eq!(parse_placeholder("__PROTECTED12__ tail", "__PROTECTED"), Some((12, 15)));
        assert_eq!(parse_placeholder("__PROTECTED__", "__PROTECTED"), None);
        assert_eq!(parse_placeholder("__PROTECTED3_", "__PROTECTED"), None);
        assert_eq!(parse_placeholder("__PROTECTED1x4__", "__PROTECTED1x"), Some((4, 16)));
    }

    #[test]
    fn test_restore_verbatim_table() {
        let table = table_with(&[(SpanKind::Quote, "\"hi\""), (SpanKind::Path, "/tmp/x")]);
        let restored = restore_originals("say __PROTECTED0__ at __PROTECTED1__", &table);
        assert_eq!(restored, "say \"hi\" at /tmp/x");
    }

    #[test]
    fn test_adjacent_tokens() {
        let table = table_with(&[(SpanKind::Path, "/a"), (SpanKind::Path, "/b")]);
        let restored = restore_originals("__PROTECTED0____PROTECTED1__", &table);
        assert_eq!(restored, "/a/b");
    }

    #[test]
    fn test_unknown_index_passes_through() {
        let table = table_with(&[(SpanKind::Path, "/a")]);
        let restored = restore_originals("x __PROTECTED7__ y __PROTECTED0__", &table);
        assert_eq!(restored, "x __PROTECTED7__ y /a");
    }

    #[test]
    fn test_resolve_verbatim_nested() {
        // path captured after a quote and containing its token
        let table = table_with(&[(SpanKind::Quote, "\"my,file\""), (SpanKind::Path, "/dir/__PROTECTED0__")]);
        let mut output = String::new();
        resolve_verbatim_into("__PROTECTED1__", &table, 2, &mut output);
        assert_eq!(output, "/dir/\"my,file\"");
    }

    #[test]
    fn test_restore_into_appends() {
        let table = table_with(&[(SpanKind::Term, "Node.js")]);
        let mut output = String::from("> ");
        restore_into("use __PROTECTED0__ now", &table, &mut output, |_, span, out| {
            out.push_str(&span.original)
        });
        assert_eq!(output, "> use Node.js now");
    }
}
