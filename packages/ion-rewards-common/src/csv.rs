//! Minimal comma-separated record codec.
//!
//! Writing quotes any field containing a comma, double quote, CR or LF and
//! doubles embedded quotes. Reading accepts the same dialect, tolerates CRLF
//! line endings and ignores blank lines. Each parsed row remembers the
//! 1-based line it started on so callers can report malformed records.

use std::borrow::Cow;

use crate::error::CommonError;

/// One parsed record and the line it started on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    pub fields: Vec<String>,
}

pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Append one record, newline-terminated.
pub fn write_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field.as_ref()));
    }
    out.push('\n');
}

/// Render a header and its records as a complete document.
pub fn render<I>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut out = String::new();
    write_row(&mut out, header);
    for row in rows {
        write_row(&mut out, &row);
    }
    out
}

pub fn parse_rows(content: &str) -> Result<Vec<CsvRow>, CommonError> {
    let mut rows = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut row_line = 1usize;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                finish_row(&mut rows, &mut fields, &mut field, row_line);
                line += 1;
                row_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(CommonError::Csv {
            line: row_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    finish_row(&mut rows, &mut fields, &mut field, row_line);

    Ok(rows)
}

fn finish_row(rows: &mut Vec<CsvRow>, fields: &mut Vec<String>, field: &mut String, line: usize) {
    fields.push(std::mem::take(field));
    let blank = fields.len() == 1 && fields[0].trim().is_empty();
    let fields = std::mem::take(fields);
    if !blank {
        rows.push(CsvRow { line, fields });
    }
}
