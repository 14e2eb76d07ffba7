use std::borrow::Cow;

mod scanner;

use scanner::{
    State, dollar_quote_closes, dollar_quote_open, opens_escape_string, scan_identifier,
    starts_with_at,
};

/// Target placeholder style for translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`.
    Postgres,
    /// SQLite-style placeholders like `?1`.
    Sqlite,
}

impl PlaceholderStyle {
    fn sigil(self) -> char {
        match self {
            PlaceholderStyle::Postgres => '$',
            PlaceholderStyle::Sqlite => '?',
        }
    }
}

/// SQL with named placeholders rewritten to positional ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedTranslation<'a> {
    /// Backend-native SQL.
    pub sql: Cow<'a, str>,
    /// Placeholder names (without `:`), where `names[i]` is positional parameter `i + 1`.
    pub names: Vec<String>,
}

impl NamedTranslation<'_> {
    /// Positional index (1-based) of a placeholder name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name).map(|i| i + 1)
    }
}

/// Rewrite `:name` placeholders into positional `$N` / `?N` placeholders.
///
/// Repeated names share a position. Text inside quotes (including Postgres
/// `E'...'` escape strings), comments and dollar-quoted blocks is left alone, as
/// are Postgres `::type` casts:
/// ```rust
/// use sql_executor::translation::{translate_named_placeholders, PlaceholderStyle};
///
/// let t = translate_named_placeholders(
///     "SELECT ':skip', id::text FROM t WHERE a = :a OR b = :a AND c = :c",
///     PlaceholderStyle::Postgres,
/// );
/// assert_eq!(t.sql, "SELECT ':skip', id::text FROM t WHERE a = $1 OR b = $1 AND c = $2");
/// assert_eq!(t.names, vec!["a".to_string(), "c".to_string()]);
/// ```
///
/// Returns a borrowed `Cow` when the query has no named placeholders.
#[must_use]
pub fn translate_named_placeholders(sql: &str, target: PlaceholderStyle) -> NamedTranslation<'_> {
    let mut out: Option<String> = None;
    let mut names: Vec<String> = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        let mut replaced = false;
        let mut consumed = if b.is_ascii() {
            1
        } else {
            sql[idx..].chars().next().map_or(1, char::len_utf8)
        };
        match state {
            State::Normal => match b {
                b'\'' if opens_escape_string(bytes, idx) => state = State::EscapeQuoted,
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'`' => state = State::Backticked,
                _ if starts_with_at(bytes, idx, b"--") => {
                    state = State::LineComment;
                    consumed = 2;
                }
                _ if starts_with_at(bytes, idx, b"/*") => {
                    state = State::BlockComment(1);
                    consumed = 2;
                }
                b'$' => {
                    if let Some((tag, tag_end)) = dollar_quote_open(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        consumed = tag_end + 1 - idx;
                    }
                }
                b':' if bytes.get(idx + 1) == Some(&b':') => {
                    consumed = 2;
                }
                b':' => {
                    if let Some((name_end, name)) = scan_identifier(bytes, idx + 1) {
                        let position = match names.iter().position(|n| n == name) {
                            Some(existing) => existing + 1,
                            None => {
                                names.push(name.to_string());
                                names.len()
                            }
                        };
                        let buf = out.get_or_insert_with(|| sql[..idx].to_string());
                        buf.push(target.sigil());
                        buf.push_str(&position.to_string());
                        consumed = name_end - idx;
                        replaced = true;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        consumed = 2; // escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::EscapeQuoted => match b {
                b'\\' => {
                    consumed = 1 + sql[idx + 1..].chars().next().map_or(0, char::len_utf8);
                }
                b'\'' if bytes.get(idx + 1) == Some(&b'\'') => consumed = 2,
                b'\'' => state = State::Normal,
                _ => {}
            },
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        consumed = 2;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Backticked => {
                if b == b'`' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if starts_with_at(bytes, idx, b"/*") {
                    state = State::BlockComment(depth + 1);
                    consumed = 2;
                } else if starts_with_at(bytes, idx, b"*/") {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    consumed = 2;
                }
            }
            State::DollarQuoted(ref tag) => {
                if dollar_quote_closes(bytes, idx, tag) {
                    consumed = tag.len() + 2;
                    state = State::Normal;
                }
            }
        }

        if let Some(ref mut buf) = out
            && !replaced
        {
            buf.push_str(&sql[idx..idx + consumed]);
        }

        idx += consumed;
    }

    NamedTranslation {
        sql: out.map_or(Cow::Borrowed(sql), Cow::Owned),
        names,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_named_to_postgres() {
        let t = translate_named_placeholders(
            "insert into t (a, b) values (:a, :b)",
            PlaceholderStyle::Postgres,
        );
        assert_eq!(t.sql, "insert into t (a, b) values ($1, $2)");
        assert_eq!(t.names, vec!["a", "b"]);
        assert_eq!(t.position("b"), Some(2));
    }

    #[test]
    fn translates_named_to_sqlite() {
        let t = translate_named_placeholders(
            "select * from t where id = :id and name = :name_2",
            PlaceholderStyle::Sqlite,
        );
        assert_eq!(t.sql, "select * from t where id = ?1 and name = ?2");
        assert_eq!(t.names, vec!["id", "name_2"]);
    }

    #[test]
    fn repeated_names_share_a_position() {
        let t = translate_named_placeholders(
            "select :x + :y + :x",
            PlaceholderStyle::Sqlite,
        );
        assert_eq!(t.sql, "select ?1 + ?2 + ?1");
        assert_eq!(t.names, vec!["x", "y"]);
    }

    #[test]
    fn escape_strings_honor_backslash_quotes() {
        let t = translate_named_placeholders(
            r"select E'it\'s :x', e'\\', 'plain' where a = :a",
            PlaceholderStyle::Postgres,
        );
        assert_eq!(t.sql, r"select E'it\'s :x', e'\\', 'plain' where a = $1");
        assert_eq!(t.names, vec!["a"]);
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "select ':a', \"col:b\" -- :c\n/* :d /* :e */ */ from t where a = :a";
        let t = translate_named_placeholders(sql, PlaceholderStyle::Postgres);
        assert_eq!(
            t.sql,
            "select ':a', \"col:b\" -- :c\n/* :d /* :e */ */ from t where a = $1"
        );
        assert_eq!(t.names, vec!["a"]);
    }

    #[test]
    fn escaped_quotes_stay_inside_the_literal() {
        let t = translate_named_placeholders(
            "select 'it''s :not' , :yes",
            PlaceholderStyle::Sqlite,
        );
        assert_eq!(t.sql, "select 'it''s :not' , ?1");
        assert_eq!(t.names, vec!["yes"]);
    }

    #[test]
    fn skips_casts_and_dollar_quoted_blocks() {
        let sql = "$fn$ select :a $fn$ where id = :id::bigint";
        let t = translate_named_placeholders(sql, PlaceholderStyle::Postgres);
        assert_eq!(t.sql, "$fn$ select :a $fn$ where id = $1::bigint");
        assert_eq!(t.names, vec!["id"]);
    }

    #[test]
    fn no_placeholders_borrows() {
        let sql = "select 1";
        let t = translate_named_placeholders(sql, PlaceholderStyle::Postgres);
        assert!(matches!(t.sql, Cow::Borrowed(_)));
        assert!(t.names.is_empty());
    }

    #[test]
    fn multibyte_text_is_preserved() {
        let t = translate_named_placeholders(
            "select 'héllo', :name, 'ü'",
            PlaceholderStyle::Sqlite,
        );
        assert_eq!(t.sql, "select 'héllo', ?1, 'ü'");
        assert_eq!(t.names, vec!["name"]);
    }
}
