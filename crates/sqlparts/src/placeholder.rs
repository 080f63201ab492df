//! Placeholder scanning.
//!
//! Two marker styles appear in rendered SQL: positional `?` and named
//! `:name`. Markers inside quoted literals, quoted identifiers, comments
//! and `::` casts are not markers. The debug rendering only substitutes `?`
//! markers; [`number_markers`] understands both and is used to translate a
//! statement into PostgreSQL's `$n` form.

use crate::error::{QbError, QbResult};
use crate::params::ParameterSet;
use crate::value::ParamKey;
use std::ops::Range;

/// One marker found by [`scan_markers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker<'a> {
    Positional,
    Named(&'a str),
}

/// Find every marker in `sql`, in order, with its byte span.
fn scan_markers(sql: &str) -> Vec<(Range<usize>, Marker<'_>)> {
    let bytes = sql.as_bytes();
    let mut markers = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        // doubled quote is an escape
                        if bytes.get(i + 1) == Some(&quote) {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = sql[i..].find('\n').map_or(bytes.len(), |p| i + p + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..].find("*/").map_or(bytes.len(), |p| i + 2 + p + 2);
            }
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
            }
            b'?' => {
                markers.push((i..i + 1, Marker::Positional));
                i += 1;
            }
            b':' if bytes
                .get(i + 1)
                .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') =>
            {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                markers.push((i..end, Marker::Named(&sql[start..end])));
                i = end;
            }
            _ => i += 1,
        }
    }
    markers
}

/// Count the `?` markers in `sql`.
pub fn count_markers(sql: &str) -> usize {
    scan_markers(sql)
        .iter()
        .filter(|(_, m)| *m == Marker::Positional)
        .count()
}

/// Replace the first `?` at or after byte offset `from` with `value`.
///
/// Returns the byte offset just past the inserted text, or `None` if no
/// marker is left. Used on condition templates, which are scanned raw.
pub(crate) fn splice_next(sql: &mut String, from: usize, value: &str) -> Option<usize> {
    let pos = sql[from..].find('?')? + from;
    sql.replace_range(pos..pos + 1, value);
    Some(pos + value.len())
}

/// Render the debug form of `sql`: each `?` becomes `"<value>"`, taken from
/// `params` in insertion order.
pub fn render_debug(sql: &str, params: &ParameterSet) -> QbResult<String> {
    let spans: Vec<Range<usize>> = scan_markers(sql)
        .into_iter()
        .filter(|(_, m)| *m == Marker::Positional)
        .map(|(span, _)| span)
        .collect();
    if spans.len() != params.len() {
        return Err(QbError::ParameterCountMismatch {
            placeholders: spans.len(),
            params: params.len(),
        });
    }

    let mut out = String::with_capacity(sql.len() + params.len() * 4);
    let mut copied = 0usize;
    for (span, value) in spans.into_iter().zip(params.values()) {
        out.push_str(&sql[copied..span.start]);
        out.push('"');
        out.push_str(&value.to_string());
        out.push('"');
        copied = span.end;
    }
    out.push_str(&sql[copied..]);
    Ok(out)
}

/// Rewrite `?` and `:name` markers to `$1, $2, ...`.
///
/// The i-th `?` refers to `ParamKey::Positional(i)`; a repeated `:name`
/// reuses its first number. The returned keys are in `$n` order.
pub fn number_markers(sql: &str) -> (String, Vec<ParamKey>) {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut keys: Vec<ParamKey> = Vec::new();
    let mut positional = 0usize;
    let mut copied = 0usize;

    for (span, marker) in scan_markers(sql) {
        out.push_str(&sql[copied..span.start]);
        let n = match marker {
            Marker::Positional => {
                keys.push(ParamKey::Positional(positional));
                positional += 1;
                keys.len()
            }
            Marker::Named(name) => {
                let key = ParamKey::named(name);
                match keys.iter().position(|k| *k == key) {
                    Some(p) => p + 1,
                    None => {
                        keys.push(key);
                        keys.len()
                    }
                }
            }
        };
        out.push_str(&format!("${n}"));
        copied = span.end;
    }
    out.push_str(&sql[copied..]);
    (out, keys)
}
