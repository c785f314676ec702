//! SQL dialect helpers: identifier quoting and placeholder styles.

/// Quote an identifier with double quotes, doubling any embedded quote.
pub fn escape_identifier(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Target dialect, used to rebind `?` placeholders before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseType {
    /// PostgreSQL uses $1, $2, etc.
    #[default]
    PostgreSQL,
    /// MySQL uses ?, ?, etc.
    MySQL,
    /// SQLite uses ?, ?, etc.
    SQLite,
}

impl DatabaseType {
    /// Get the parameter placeholder for this database type.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index),
            Self::MySQL | Self::SQLite => "?".to_string(),
        }
    }

    /// Whether the dialect accepts double-quoted identifiers.
    pub fn quotes_identifiers(&self) -> bool {
        !matches!(self, Self::MySQL)
    }
}

/// Walk `sql`, calling `on_code` for every character outside string literals,
/// quoted identifiers and comments. Everything else is copied through.
pub(crate) fn scan_code(sql: &str, mut on_code: impl FnMut(&mut String, &[char], usize) -> usize) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' | '`' => {
                out.push(c);
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    if chars[i] == c {
                        // doubled quote is an escaped quote
                        if i + 1 < chars.len() && chars[i + 1] == c {
                            out.push(c);
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            _ => {
                i = on_code(&mut out, &chars, i);
            }
        }
    }

    out
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_ilike_at(chars: &[char], i: usize) -> bool {
    const KEYWORD: [char; 5] = ['i', 'l', 'i', 'k', 'e'];
    if i + KEYWORD.len() > chars.len() || (i > 0 && is_word_char(chars[i - 1])) {
        return false;
    }
    let matches = chars[i..i + KEYWORD.len()]
        .iter()
        .zip(KEYWORD)
        .all(|(c, k)| c.to_ascii_lowercase() == k);
    matches && !chars.get(i + KEYWORD.len()).is_some_and(|c| is_word_char(*c))
}

/// Adapt generated SQL to the dialect.
///
/// PostgreSQL gets `$n` placeholders. The other dialects keep `?` and get
/// `LIKE` for `ILIKE`, since their `LIKE` is already case-insensitive.
pub fn rebind(sql: &str, db: DatabaseType) -> String {
    let mut n = 0;
    scan_code(sql, |out, chars, i| match chars[i] {
        '?' if db == DatabaseType::PostgreSQL => {
            n += 1;
            out.push_str(&db.placeholder(n));
            i + 1
        }
        'i' | 'I' if db != DatabaseType::PostgreSQL && is_ilike_at(chars, i) => {
            out.push_str("LIKE");
            i + 5
        }
        c => {
            out.push(c);
            i + 1
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("user"), "\"user\"");
        assert_eq!(escape_identifier("has\"quote"), "\"has\"\"quote\"");
    }

    #[test]
    fn test_database_placeholder() {
        assert_eq!(DatabaseType::PostgreSQL.placeholder(5), "$5");
        assert_eq!(DatabaseType::MySQL.placeholder(1), "?");
        assert_eq!(DatabaseType::SQLite.placeholder(1), "?");
    }

    #[test]
    fn test_rebind_postgres() {
        let sql = "SELECT * FROM t WHERE a = ? AND b IN (?, ?) AND c = '?'";
        assert_eq!(
            rebind(sql, DatabaseType::PostgreSQL),
            "SELECT * FROM t WHERE a = $1 AND b IN ($2, $3) AND c = '?'"
        );
    }

    #[test]
    fn test_rebind_question_mark_dialects_untouched() {
        let sql = "SELECT ? -- why?";
        assert_eq!(rebind(sql, DatabaseType::SQLite), sql);
        assert_eq!(rebind(sql, DatabaseType::MySQL), sql);
    }

    #[test]
    fn test_rebind_lowers_ilike_outside_postgres() {
        let sql = "SELECT * FROM t WHERE name ILIKE ? AND note = 'ILIKE' AND fooilike = 1";
        assert_eq!(
            rebind(sql, DatabaseType::SQLite),
            "SELECT * FROM t WHERE name LIKE ? AND note = 'ILIKE' AND fooilike = 1"
        );
        assert_eq!(
            rebind("a ilike ?", DatabaseType::PostgreSQL),
            "a ilike $1"
        );
    }

    #[test]
    fn test_rebind_skips_comments_and_escaped_quotes() {
        let sql = "SELECT 'it''s ?', ? -- trailing ?\n, ?";
        assert_eq!(
            rebind(sql, DatabaseType::PostgreSQL),
            "SELECT 'it''s ?', $1 -- trailing ?\n, $2"
        );
    }
}
