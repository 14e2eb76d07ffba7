/// Lexical context while walking SQL text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    /// Postgres `E'...'` literal, where backslash escapes the next character.
    EscapeQuoted,
    DoubleQuoted,
    Backticked,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

pub(super) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Scan a placeholder name starting at `start`; returns the end index and the name.
pub(super) fn scan_identifier(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let mut idx = start;
    while idx < bytes.len() && is_ident_byte(bytes[idx]) {
        idx += 1;
    }
    if idx == start {
        None
    } else {
        std::str::from_utf8(&bytes[start..idx])
            .ok()
            .map(|name| (idx, name))
    }
}

/// Whether the quote at `idx` opens an `E'...'` escape string.
pub(super) fn opens_escape_string(bytes: &[u8], idx: usize) -> bool {
    match idx.checked_sub(1).map(|prev| (prev, bytes[prev])) {
        Some((prev, b'E' | b'e')) => prev == 0 || !is_ident_byte(bytes[prev - 1]),
        _ => false,
    }
}

pub(super) fn starts_with_at(bytes: &[u8], idx: usize, pat: &[u8]) -> bool {
    bytes.get(idx..idx + pat.len()) == Some(pat)
}

/// Recognize a `$tag$` opener at `start`; returns the tag and the index of its closing `$`.
pub(super) fn dollar_quote_open(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    // `$1` is a positional parameter, not a quote tag.
    if bytes.get(start + 1).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let mut idx = start + 1;
    while idx < bytes.len() && bytes[idx] != b'$' {
        if !is_ident_byte(bytes[idx]) {
            return None;
        }
        idx += 1;
    }
    if idx < bytes.len() {
        let tag = std::str::from_utf8(&bytes[start + 1..idx]).ok()?.to_string();
        Some((tag, idx))
    } else {
        None
    }
}

/// Whether `$tag$` closes the dollar-quoted block at `idx`.
pub(super) fn dollar_quote_closes(bytes: &[u8], idx: usize, tag: &str) -> bool {
    bytes.get(idx) == Some(&b'$')
        && starts_with_at(bytes, idx + 1, tag.as_bytes())
        && bytes.get(idx + 1 + tag.len()) == Some(&b'$')
}
