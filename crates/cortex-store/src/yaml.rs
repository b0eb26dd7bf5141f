//! A hand-rolled parser for the restricted YAML subset the node file format
//! uses. This is deliberately not a general YAML parser: it only needs to
//! understand scalar `key: value` lines, two-space nested blocks, and
//! single-line bracketed arrays, because that's the entire shape the node
//! file format uses. Keeping it hand-rolled (rather than pulling in a full
//! YAML crate) is what lets the store guarantee exact body preservation and
//! accept the legacy flattened `_llm_*` keys alongside the nested `_llm:`
//! block.

/// One line of front-matter with its leading-space indentation already
/// measured and stripped.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    pub indent: usize,
    pub content: &'a str,
}

/// Splits front-matter text into non-blank lines, each tagged with its
/// indentation depth (count of leading ASCII spaces).
pub(crate) fn tokenize(text: &str) -> Vec<Line<'_>> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            let stripped = l.trim_start_matches(' ');
            let indent = l.len() - stripped.len();
            Line {
                indent,
                content: stripped.trim_end(),
            }
        })
        .collect()
}

/// Returns the half-open range `[start, end)` of lines that are children of
/// a block whose own line sits at `parent_indent` — i.e. every line more
/// deeply indented than `parent_indent`, stopping at the first line that
/// dedents back to `parent_indent` or shallower.
pub(crate) fn children_range(lines: &[Line<'_>], start: usize, parent_indent: usize) -> usize {
    let mut end = start;
    while end < lines.len() && lines[end].indent > parent_indent {
        end += 1;
    }
    end
}

/// Splits a `key: value` line into its trimmed key and trimmed (possibly
/// empty) remainder. Lines with no `:` return the whole content as the key
/// with an empty value — callers treat that defensively as "nothing useful
/// here" rather than panicking.
pub(crate) fn split_key_value(content: &str) -> (&str, &str) {
    match content.split_once(':') {
        Some((k, v)) => (k.trim(), v.trim()),
        None => (content.trim(), ""),
    }
}

/// Strips a single layer of matching quotes (`"..."` or `'...'`) from a
/// scalar value. Unquoted input is returned unchanged (already trimmed).
pub(crate) fn unquote(s: &str) -> String {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return s[1..s.len() - 1].to_string();
        }
    }
    s.to_string()
}

/// Parses a single-line bracketed array `[a, b, c]` into its unquoted,
/// trimmed elements. Returns an empty vec for anything that doesn't look
/// like a bracketed array (including `[]`).
pub(crate) fn parse_inline_list(s: &str) -> Vec<String> {
    let s = s.trim();
    let Some(inner) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) else {
        return Vec::new();
    };
    inner
        .split(',')
        .map(|part| unquote(part.trim()))
        .filter(|part| !part.is_empty())
        .collect()
}

/// `true`/`false`/`null` scalar detection, used when a field's absence vs.
/// explicit null matters (e.g. `hash: null`).
pub(crate) fn is_null(s: &str) -> bool {
    s == "null"
}
