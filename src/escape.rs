//! Literal encoding helpers shared by every dialect.

/// Character that escapes LIKE wildcards in [`escape_string`] output.
pub const LIKE_ESCAPE_CHAR: char = '!';

/// Removes control characters that must never reach SQL text.
///
/// Tab, line feed and carriage return are kept.
pub fn strip_invisible(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}'))
        .collect()
}

/// Escapes a string for use inside a single-quoted SQL literal.
///
/// The result is not quoted. With `like` set, `%` and `_` are escaped with
/// [`LIKE_ESCAPE_CHAR`], and the escape character itself is doubled first.
pub fn escape_string(value: &str, like: bool) -> String {
    let escaped = strip_invisible(value).replace('\'', "''");
    if !like {
        return escaped;
    }
    let esc = LIKE_ESCAPE_CHAR;
    escaped
        .replace(esc, &format!("{esc}{esc}"))
        .replace('%', &format!("{esc}%"))
        .replace('_', &format!("{esc}_"))
}

/// Doubles every backslash, for servers that treat `\` as an escape
/// character inside string literals.
pub fn escape_backslashes(value: &str) -> String {
    value.replace('\\', "\\\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote_string(value: &str) -> String {
        format!("'{}'", escape_string(value, false))
    }

    /// Reads a single-quoted literal back, undoing apostrophe doubling.
    fn unquote(literal: &str) -> String {
        literal[1..literal.len() - 1].replace("''", "'")
    }

    #[test]
    fn test_apostrophes_are_doubled() {
        assert_eq!(escape_string("O'Brien", false), "O''Brien");
        assert_eq!(quote_string("it's"), "'it''s'");
    }

    #[test]
    fn test_injection_attempt_stays_inside_literal() {
        assert_eq!(
            quote_string("'; DROP TABLE users; --"),
            "'''; DROP TABLE users; --'"
        );
    }

    #[test]
    fn test_control_characters_stripped() {
        assert_eq!(strip_invisible("a\u{0}b\u{7}c\u{7F}"), "abc");
        assert_eq!(strip_invisible("line\nnext\tcol\r"), "line\nnext\tcol\r");
    }

    #[test]
    fn test_like_escaping() {
        assert_eq!(escape_string("50%_off", true), "50!%!_off");
        assert_eq!(escape_string("wow!", true), "wow!!");
        assert_eq!(escape_string("100%!", true), "100!%!!");
        assert_eq!(escape_string("50%", false), "50%");
    }

    #[test]
    fn test_quoting_is_reversible() {
        for original in ["", "plain", "O'Brien", "''", "a'b'c'", "?'?", "ünïcødé ' ok"] {
            assert_eq!(unquote(&quote_string(original)), original);
        }
    }

    #[test]
    fn test_backslashes_are_doubled() {
        assert_eq!(escape_backslashes(r"a\b"), r"a\\b");
        assert_eq!(escape_backslashes(r"\'"), r"\\'");
        assert_eq!(escape_backslashes("plain"), "plain");
    }
}
