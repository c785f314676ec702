//! Named placeholder binding.
//!
//! Templates refer to parameters as `:name` (names may contain dots). Binding
//! rewrites every placeholder to `?`, collects the values in order, and
//! expands list values into `?, ?, ?` so they can sit inside `IN (...)`.
//! Quoted text, comments and `::` casts are left untouched.

use crate::param::{NamedParams, SqlValue};
use crate::sql::scan_code;

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Rewrite `:name` placeholders into positional `?` and collect their values.
///
/// # Panics
///
/// If a placeholder has no value in `params`; the template and its input type
/// disagree, which is a programming error.
pub fn bind_named(sql: &str, params: &NamedParams) -> (String, Vec<SqlValue>) {
    let mut args = Vec::new();

    let out = scan_code(sql, |out, chars, i| {
        if chars[i] != ':' {
            out.push(chars[i]);
            return i + 1;
        }

        if chars.get(i + 1) == Some(&':') {
            out.push_str("::");
            return i + 2;
        }

        let mut end = i + 1;
        while end < chars.len() && is_name_char(chars[end]) {
            end += 1;
        }
        while end > i + 1 && chars[end - 1] == '.' {
            end -= 1;
        }
        if end == i + 1 {
            out.push(':');
            return i + 1;
        }

        let name: String = chars[i + 1..end].iter().collect();
        let value = match params.get(&name) {
            Some(value) => value,
            None => panic!("missing value for named parameter `:{}`", name),
        };

        match value {
            SqlValue::List(items) if !items.is_empty() => {
                out.push_str(&vec!["?"; items.len()].join(", "));
                args.extend(items.iter().cloned());
            }
            SqlValue::List(_) => {
                out.push('?');
                args.push(SqlValue::Null);
            }
            other => {
                out.push('?');
                args.push(other.clone());
            }
        }
        end
    });

    (out, args)
}

fn is_values_at(chars: &[char], i: usize) -> bool {
    const KEYWORD: [char; 6] = ['v', 'a', 'l', 'u', 'e', 's'];
    if i + KEYWORD.len() > chars.len() || (i > 0 && is_name_char(chars[i - 1])) {
        return false;
    }
    chars[i..i + KEYWORD.len()]
        .iter()
        .zip(KEYWORD)
        .all(|(c, k)| c.to_ascii_lowercase() == k)
}

/// Locate the parenthesised group following `VALUES`, as a char range.
fn values_group(sql: &str) -> Option<(usize, usize)> {
    let mut open: Option<usize> = None;
    let mut depth = 0usize;
    let mut found = None;

    scan_code(sql, |_, chars, i| {
        if found.is_some() {
            return chars.len();
        }
        match open {
            Some(start) => {
                match chars[i] {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            found = Some((start, i + 1));
                        }
                    }
                    _ => {}
                }
                i + 1
            }
            None if is_values_at(chars, i) => {
                let mut j = i + 6;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                if chars.get(j) == Some(&'(') {
                    open = Some(j);
                    depth = 1;
                    j + 1
                } else {
                    i + 1
                }
            }
            None => i + 1,
        }
    });

    found
}

/// Bind a multi-row insert: the `VALUES (...)` group is repeated once per row.
///
/// Placeholders outside the group are bound from the first row.
///
/// # Panics
///
/// If `rows` is empty, or the template has no `VALUES (...)` group.
pub fn bind_batch(sql: &str, rows: &[NamedParams]) -> (String, Vec<SqlValue>) {
    assert!(!rows.is_empty(), "batch binding needs at least one row");

    let Some((start, end)) = values_group(sql) else {
        panic!("batch query has no VALUES (...) group: {}", sql.trim());
    };

    let chars: Vec<char> = sql.chars().collect();
    let before: String = chars[..start].iter().collect();
    let group: String = chars[start..end].iter().collect();
    let after: String = chars[end..].iter().collect();

    let (mut out, mut args) = bind_named(&before, &rows[0]);
    for (n, row) in rows.iter().enumerate() {
        if n > 0 {
            out.push_str(", ");
        }
        let (text, row_args) = bind_named(&group, row);
        out.push_str(&text);
        args.extend(row_args);
    }
    let (tail, tail_args) = bind_named(&after, &rows[0]);
    out.push_str(&tail);
    args.extend(tail_args);

    (out, args)
}
