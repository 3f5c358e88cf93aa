//! Whitespace normalization for generated statements.

use std::iter::Peekable;
use std::str::Chars;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Gap {
    None,
    Space,
    Newline,
}

/// Collapse a statement onto one line.
///
/// Runs of whitespace become a single space and leading/trailing whitespace
/// is dropped. Quoted literals and identifiers (`'..'`, `".."`, `[..]`,
/// `` `..` ``) and block comments are copied verbatim. Inside `'..'` a
/// backslash escapes the next character as MySQL and `E'..'` strings do, so
/// `'it\'s'` stays one literal. A `--` comment keeps the line break that ends
/// it, otherwise it would swallow the rest of the statement.
///
/// ```
/// use schemalens_sql::simple_format;
///
/// let sql = "SELECT [Product ID],\n       'a  b'\n  FROM   [Products]\n";
/// assert_eq!(simple_format(sql), "SELECT [Product ID], 'a  b' FROM [Products]");
/// ```
pub fn simple_format(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut gap = Gap::None;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch.is_whitespace() {
            if gap == Gap::None {
                gap = Gap::Space;
            }
            continue;
        }

        if !out.is_empty() {
            match gap {
                Gap::Space => out.push(' '),
                Gap::Newline => out.push('\n'),
                Gap::None => {}
            }
        }
        gap = Gap::None;
        out.push(ch);

        match ch {
            '\'' => copy_quoted(&mut chars, &mut out, '\''),
            '"' => copy_quoted(&mut chars, &mut out, '"'),
            '`' => copy_quoted(&mut chars, &mut out, '`'),
            '[' => copy_quoted(&mut chars, &mut out, ']'),
            '-' if chars.peek() == Some(&'-') => {
                copy_line_comment(&mut chars, &mut out);
                gap = Gap::Newline;
            }
            '/' if chars.peek() == Some(&'*') => copy_block_comment(&mut chars, &mut out),
            _ => {}
        }
    }

    out
}

/// Copy up to and including the closing delimiter. A doubled delimiter is
/// an escape and does not close the section, nor does a backslash pair in a
/// string literal.
fn copy_quoted(chars: &mut Peekable<Chars<'_>>, out: &mut String, close: char) {
    while let Some(ch) = chars.next() {
        out.push(ch);
        if ch == '\\' && close == '\'' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
            continue;
        }
        if ch == close {
            if chars.peek() == Some(&close) {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
                continue;
            }
            return;
        }
    }
}

fn copy_line_comment(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
    while let Some(&ch) = chars.peek() {
        if ch == '\n' || ch == '\r' {
            return;
        }
        out.push(ch);
        chars.next();
    }
}

fn copy_block_comment(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
    // The opening `*` cannot also start the closing `*/`.
    if let Some(open) = chars.next() {
        out.push(open);
    }
    let mut previous = '\0';
    for ch in chars.by_ref() {
        out.push(ch);
        if previous == '*' && ch == '/' {
            return;
        }
        previous = ch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_line_breaks_and_indentation() {
        let sql = "  SELECT a,\n\t\tb\r\n  FROM t  \n WHERE a = 1 \n";
        assert_eq!(simple_format(sql), "SELECT a, b FROM t WHERE a = 1");
    }

    #[test]
    fn keeps_whitespace_inside_literals() {
        let sql = "SELECT 'two  spaces\nand a line'  FROM t";
        assert_eq!(simple_format(sql), "SELECT 'two  spaces\nand a line' FROM t");
    }

    #[test]
    fn keeps_escaped_quotes_inside_literals() {
        let sql = "SELECT 'it''s   here'   AS x";
        assert_eq!(simple_format(sql), "SELECT 'it''s   here' AS x");
    }

    #[test]
    fn backslash_escaped_quote_does_not_end_literal() {
        let sql = r"SELECT 'it\'s   here'   AS x";
        assert_eq!(simple_format(sql), r"SELECT 'it\'s   here' AS x");
        assert_eq!(simple_format(r"SELECT 'C:\\'   AS dir"), r"SELECT 'C:\\' AS dir");
    }

    #[test]
    fn keeps_whitespace_inside_quoted_identifiers() {
        assert_eq!(
            simple_format("SELECT [Unit   Price],  \"a  b\",   `c  d`   FROM [Order]]  Details]"),
            "SELECT [Unit   Price], \"a  b\", `c  d` FROM [Order]]  Details]"
        );
    }

    #[test]
    fn line_comment_keeps_its_line_break() {
        let sql = "SELECT a -- pick  a\n   FROM t";
        assert_eq!(simple_format(sql), "SELECT a -- pick  a\nFROM t");
    }

    #[test]
    fn block_comment_is_copied_verbatim() {
        let sql = "SELECT /* a\n   b */   1";
        assert_eq!(simple_format(sql), "SELECT /* a\n   b */ 1");
        assert_eq!(simple_format("SELECT /*/ x */  1"), "SELECT /*/ x */ 1");
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "SELECT a,\n b FROM t",
            "SELECT 'x  y' -- note\n  FROM [a  b]",
            "  /* c */  SELECT\t1  ",
            "SELECT 'unterminated   ",
            r"SELECT 'a\'b   c'  FROM t",
            "",
        ];
        for sql in inputs {
            let once = simple_format(sql);
            assert_eq!(simple_format(&once), once, "not idempotent for {sql:?}");
        }
    }

    #[test]
    fn only_changes_whitespace() {
        let sql = "SELECT [ProductID],\n  [ProductName]\nFROM [Products]\nWHERE x >= (1 * (2 - 1))";
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        assert_eq!(strip(&simple_format(sql)), strip(sql));
    }
}
