use crate::binding::{BindingMap, Marker};
use crate::error::SqlFacadeError;
use crate::value::SqlValue;

/// Placeholder style of a target backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style numbered placeholders like `$1`.
    Numbered,
    /// SQLite-style anonymous placeholders, `?`.
    Anonymous,
}

/// A statement lowered to one placeholder style, plus the marker slots in
/// the order the backend will bind them.
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub sql: String,
    pub slots: Vec<Marker>,
}

/// Rewrite `:name` and `?` markers to the target placeholder style.
///
/// The scan skips string literals, quoted identifiers, comments,
/// dollar-quoted blocks, and `::` casts. Numbered output assigns `$N` in
/// first-appearance order and reuses the index for repeated named markers;
/// anonymous output emits one `?` per occurrence, repeating values as needed.
/// Native placeholders already in the text (`$1`, `?3`) pass through
/// untouched, and a statement containing only those produces no slots.
#[must_use]
pub fn rewrite_markers(sql: &str, style: PlaceholderStyle) -> Rewritten {
    let bytes = sql.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(sql.len());
    let mut slots: Vec<Marker> = Vec::new();
    let mut named_indices: Vec<String> = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => {
                    state = State::SingleQuoted;
                    out.push(b);
                }
                b'"' => {
                    state = State::DoubleQuoted;
                    out.push(b);
                }
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = State::LineComment;
                    out.extend_from_slice(b"--");
                    idx += 1;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment(1);
                    out.extend_from_slice(b"/*");
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        out.extend_from_slice(&bytes[idx..=advance]);
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    } else {
                        out.push(b);
                    }
                }
                b'?' if !matches!(bytes.get(idx + 1), Some(d) if d.is_ascii_digit()) => {
                    match style {
                        PlaceholderStyle::Numbered => {
                            slots.push(Marker::Positional);
                            out.push(b'$');
                            out.extend_from_slice(slots.len().to_string().as_bytes());
                        }
                        PlaceholderStyle::Anonymous => {
                            slots.push(Marker::Positional);
                            out.push(b'?');
                        }
                    }
                }
                b':' if bytes.get(idx + 1) == Some(&b':') => {
                    out.extend_from_slice(b"::");
                    idx += 1;
                }
                b':' => {
                    if let Some((name, end)) = scan_identifier(bytes, idx + 1) {
                        match style {
                            PlaceholderStyle::Numbered => {
                                let index = named_indices
                                    .iter()
                                    .position(|n| *n == name)
                                    .unwrap_or_else(|| {
                                        named_indices.push(name.clone());
                                        slots.push(Marker::Named(name.clone()));
                                        slots.len() - 1
                                    });
                                out.push(b'$');
                                out.extend_from_slice((index + 1).to_string().as_bytes());
                            }
                            PlaceholderStyle::Anonymous => {
                                slots.push(Marker::Named(name));
                                out.push(b'?');
                            }
                        }
                        idx = end - 1;
                    } else {
                        out.push(b);
                    }
                }
                _ => out.push(b),
            },
            State::SingleQuoted => {
                out.push(b);
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        out.push(b'\'');
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                out.push(b);
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        out.push(b'"');
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                out.push(b);
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                out.push(b);
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    out.push(b'*');
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    out.push(b'/');
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                out.push(b);
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    out.extend_from_slice(&bytes[idx + 1..=idx + tag_len + 1]);
                    state = State::Normal;
                    idx += tag_len + 1;
                }
            }
        }
        idx += 1;
    }

    Rewritten {
        sql: String::from_utf8_lossy(&out).into_owned(),
        slots,
    }
}

/// Order the bound values to match rewritten slots.
///
/// With no slots the statement kept native placeholders, and the binding
/// entries bind positionally in their given order.
///
/// # Errors
/// `UnresolvedBinding` when a slot has no corresponding value.
pub fn bind_slots(
    slots: &[Marker],
    bindings: &BindingMap,
) -> Result<Vec<SqlValue>, SqlFacadeError> {
    if slots.is_empty() {
        return Ok(bindings.iter().map(|(_, value)| value.clone()).collect());
    }
    let mut positional = bindings.positional();
    slots
        .iter()
        .map(|slot| match slot {
            Marker::Positional => positional.next().cloned().ok_or_else(|| {
                SqlFacadeError::UnresolvedBinding(
                    "positional values exhausted while binding".to_string(),
                )
            }),
            Marker::Named(name) => bindings.get_named(name).cloned().ok_or_else(|| {
                SqlFacadeError::UnresolvedBinding(format!("no value supplied for marker :{name}"))
            }),
        })
        .collect()
}

enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

fn scan_identifier(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let first = *bytes.get(start)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let mut idx = start + 1;
    while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_') {
        idx += 1;
    }
    std::str::from_utf8(&bytes[start..idx])
        .ok()
        .map(|name| (name.to_string(), idx))
}

fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let mut idx = start + 1;
    while idx < bytes.len() && bytes[idx] != b'$' {
        let b = bytes[idx];
        if !(b.is_ascii_alphanumeric() || b == b'_') {
            return None;
        }
        idx += 1;
    }

    if idx < bytes.len() && bytes[idx] == b'$' {
        let tag = String::from_utf8(bytes[start + 1..idx].to_vec()).ok()?;
        Some((tag, idx))
    } else {
        None
    }
}

fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    end < bytes.len()
        && bytes[idx + 1..=end].starts_with(tag.as_bytes())
        && bytes.get(end) == Some(&b'$')
}
