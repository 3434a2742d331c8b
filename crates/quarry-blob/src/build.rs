//! Building text into a blob.
//!
//! Two families write text. The general formatter (`append_fmt`, `write!`,
//! and the HTML, JSON and shell escapers) marks the blob as "not pure SQL".
//! The SQL family (`append_sql*`) never does. [`Blob::sql_text`] refuses
//! a marked blob, so escaped display text cannot leak into an SQL
//! statement by accident.

use std::fmt;

use crate::blob::{Blob, FLAG_NOT_SQL};
use crate::fatal;

impl<'a> Blob<'a> {
    pub(crate) fn mark_not_sql(&mut self) {
        self.flags |= FLAG_NOT_SQL;
    }

    /// Returns `true` if only the SQL family has written text into the blob.
    pub fn is_pure_sql(&self) -> bool {
        self.flags & FLAG_NOT_SQL == 0
    }

    /// Append formatted text through the general formatter.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) {
        // Writing into a blob cannot fail; an error here can only come from
        // a Display impl, and whatever it wrote is kept.
        let _ = fmt::Write::write_fmt(self, args);
    }

    /// Append `text` with `&`, `<`, `>`, `"` and `'` replaced by entities.
    pub fn append_html_escaped(&mut self, text: &str) {
        self.mark_not_sql();
        let bytes = text.as_bytes();
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let entity: &[u8] = match b {
                b'&' => b"&amp;",
                b'<' => b"&lt;",
                b'>' => b"&gt;",
                b'"' => b"&quot;",
                b'\'' => b"&#39;",
                _ => continue,
            };
            self.append(&bytes[start..i]);
            self.append(entity);
            start = i + 1;
        }
        self.append(&bytes[start..]);
    }

    /// Append `text` as a quoted JSON string.
    pub fn append_json_string(&mut self, text: &str) {
        self.mark_not_sql();
        match serde_json::to_string(text) {
            Ok(quoted) => self.append(quoted.as_bytes()),
            Err(e) => fatal!("append_json_string: {e}"),
        }
    }

    // ---------------------------------------------------------------
    // SQL family
    // ---------------------------------------------------------------

    /// Append literal SQL text.
    pub fn append_sql(&mut self, sql: &str) {
        self.append(sql.as_bytes());
    }

    /// Append `text` with every `'` doubled, without surrounding quotes.
    pub fn append_sql_escaped(&mut self, text: &str) {
        for (i, part) in text.split('\'').enumerate() {
            if i > 0 {
                self.append(b"''");
            }
            self.append(part.as_bytes());
        }
    }

    /// Append a `'`-quoted string literal, or `NULL` for `None`.
    pub fn append_sql_string(&mut self, text: Option<&str>) {
        match text {
            Some(text) => {
                self.append_char(b'\'');
                self.append_sql_escaped(text);
                self.append_char(b'\'');
            }
            None => self.append(b"NULL"),
        }
    }

    /// Append a `"`-quoted identifier with every `"` doubled.
    pub fn append_sql_ident(&mut self, ident: &str) {
        self.append_char(b'"');
        for (i, part) in ident.split('"').enumerate() {
            if i > 0 {
                self.append(b"\"\"");
            }
            self.append(part.as_bytes());
        }
        self.append_char(b'"');
    }

    /// Append a decimal integer.
    pub fn append_sql_int(&mut self, value: i64) {
        self.append(value.to_string().as_bytes());
    }

    /// The content as SQL text.
    ///
    /// Fatal if the general formatter has written into this blob or if the
    /// content is not UTF-8.
    pub fn sql_text(&self) -> &str {
        if !self.is_pure_sql() {
            fatal!("sql_text: blob was built with the general formatter and is not pure SQL");
        }
        match std::str::from_utf8(self.as_bytes()) {
            Ok(sql) => sql,
            Err(e) => fatal!("sql_text: blob is not valid UTF-8: {e}"),
        }
    }
}

impl fmt::Write for Blob<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.mark_not_sql();
        self.append(s.as_bytes());
        Ok(())
    }
}
