/// The category assigned to a raw SQL string, driving the dispatcher's
/// safety checks and result shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// SELECT or DESCRIBE: returns a row set.
    Read,
    /// DELETE: returns rows affected; requires a WHERE clause.
    Delete,
    /// INSERT: returns rows affected.
    Insert,
    /// UPDATE: returns rows affected.
    Update,
    /// CREATE or ALTER: returns a success flag.
    Ddl,
    /// None of the recognized keywords appear.
    Unsupported,
}

impl CommandClass {
    /// Classify SQL by keyword, case-insensitively, first match wins under
    /// the fixed precedence Read, Delete, Insert, Update, Ddl.
    ///
    /// Keywords are matched against words scanned outside string literals and
    /// comments, so `DELETE FROM logs WHERE msg = 'select'` classifies as
    /// Delete, not Read.
    #[must_use]
    pub fn classify(sql: &str) -> CommandClass {
        let words = keywords(sql);
        let has = |keyword: &str| words.iter().any(|w| w == keyword);
        if has("select") || has("describe") {
            CommandClass::Read
        } else if has("delete") {
            CommandClass::Delete
        } else if has("insert") {
            CommandClass::Insert
        } else if has("update") {
            CommandClass::Update
        } else if has("create") || has("alter") {
            CommandClass::Ddl
        } else {
            CommandClass::Unsupported
        }
    }
}

/// True if `word` appears as a whole word in the SQL, outside string literals
/// and comments. Backs the DELETE-requires-WHERE guard.
#[must_use]
pub fn contains_keyword(sql: &str, word: &str) -> bool {
    let lowered = word.to_ascii_lowercase();
    keywords(sql).iter().any(|w| *w == lowered)
}

enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// Collect lowercased identifier words from the regions of the SQL that are
/// neither quoted nor commented.
fn keywords(sql: &str) -> Vec<String> {
    let bytes = sql.as_bytes();
    let mut words = Vec::new();
    let mut current = String::new();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => {
                    flush(&mut current, &mut words);
                    state = State::SingleQuoted;
                }
                b'"' => {
                    flush(&mut current, &mut words);
                    state = State::DoubleQuoted;
                }
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    flush(&mut current, &mut words);
                    state = State::LineComment;
                    idx += 1;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    flush(&mut current, &mut words);
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    flush(&mut current, &mut words);
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                _ if b.is_ascii_alphanumeric() || b == b'_' => {
                    current.push(b.to_ascii_lowercase() as char);
                }
                _ => flush(&mut current, &mut words),
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    state = State::Normal;
                    idx += tag_len;
                }
            }
        }
        idx += 1;
    }
    flush(&mut current, &mut words);
    words
}

fn flush(current: &mut String, words: &mut Vec<String>) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_leading_keyword() {
        assert_eq!(CommandClass::classify("SELECT * FROM fruits"), CommandClass::Read);
        assert_eq!(CommandClass::classify("describe fruits"), CommandClass::Read);
        assert_eq!(
            CommandClass::classify("DELETE FROM fruits WHERE name = 'mango'"),
            CommandClass::Delete
        );
        assert_eq!(
            CommandClass::classify("insert into fruits (name) values (?)"),
            CommandClass::Insert
        );
        assert_eq!(
            CommandClass::classify("UPDATE fruits SET qty = 1"),
            CommandClass::Update
        );
        assert_eq!(CommandClass::classify("CREATE TABLE t (id INTEGER)"), CommandClass::Ddl);
        assert_eq!(CommandClass::classify("ALTER TABLE t ADD c TEXT"), CommandClass::Ddl);
        assert_eq!(CommandClass::classify("DROP TABLE fruits"), CommandClass::Unsupported);
    }

    #[test]
    fn precedence_is_read_before_delete_before_insert() {
        // subquery: both delete and select appear; read wins
        assert_eq!(
            CommandClass::classify("DELETE FROM t WHERE id IN (SELECT id FROM old)"),
            CommandClass::Read
        );
        assert_eq!(
            CommandClass::classify("INSERT INTO t SELECT * FROM s"),
            CommandClass::Read
        );
    }

    #[test]
    fn keywords_inside_literals_do_not_count() {
        assert_eq!(
            CommandClass::classify("DELETE FROM logs WHERE msg = 'select everything'"),
            CommandClass::Delete
        );
        assert_eq!(
            CommandClass::classify("UPDATE t SET c = 'insert' WHERE id = 1"),
            CommandClass::Update
        );
    }

    #[test]
    fn keywords_inside_comments_do_not_count() {
        assert_eq!(
            CommandClass::classify("-- select nothing\nDELETE FROM t WHERE id = 1"),
            CommandClass::Delete
        );
        assert_eq!(
            CommandClass::classify("/* select */ UPDATE t SET a = 1 WHERE b = 2"),
            CommandClass::Update
        );
    }

    #[test]
    fn contains_keyword_ignores_literal_content() {
        assert!(contains_keyword("DELETE FROM t WHERE id = 1", "where"));
        assert!(!contains_keyword("DELETE FROM t -- where", "where"));
        assert!(!contains_keyword("DELETE FROM t /* where */", "where"));
        assert!(!contains_keyword("SELECT 'where' FROM t", "where"));
    }

    #[test]
    fn partial_words_do_not_match() {
        assert!(!contains_keyword("SELECT whereabouts FROM t", "where"));
        assert_eq!(
            CommandClass::classify("updated_rows_report"),
            CommandClass::Unsupported
        );
    }
}
