// ============================================================
// CSV PARSER
// ============================================================
// Split raw CSV text into rows, honoring quoting and comment lines

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use tracing::debug;

use crate::domain::csv::{ColumnIndex, CsvRow, ReaderOptions};
use crate::domain::error::AppError;

const BOM: char = '\u{feff}';

/// CSV parser over an in-memory buffer
pub struct CsvParser {
    options: ReaderOptions,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(ReaderOptions::default())
    }
}

impl CsvParser {
    pub fn new(options: ReaderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Validate the text's structure and read the header.
    ///
    /// Fails with `MalformedInput` on an unterminated quoted field. The
    /// returned table re-parses from the start on every `rows()` call.
    pub fn parse_content<'a>(&self, content: &'a str) -> Result<ParsedTable<'a>, AppError> {
        self.options.validate().map_err(AppError::Config)?;

        let content = content.strip_prefix(BOM).unwrap_or(content);
        check_quoting(content, &self.options)?;

        let mut table = ParsedTable {
            content,
            options: self.options.clone(),
            columns: ColumnIndex::new(None),
        };

        if self.options.has_header {
            let mut records = table.records();
            let header = match records.next() {
                Some(Ok(record)) => Some(record_cells(&record)),
                Some(Err(e)) => return Err(malformed(e)),
                None => None,
            };
            table.columns = ColumnIndex::new(header.as_deref());
        }

        Ok(table)
    }

    /// Parse everything up front. Any structural error fails the whole call.
    pub fn parse_rows(&self, content: &str) -> Result<(ColumnIndex, Vec<CsvRow>), AppError> {
        let table = self.parse_content(content)?;
        let rows = table.rows().collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Parsed {} rows ({} header columns)",
            rows.len(),
            table.columns().headers().len()
        );
        Ok((table.columns, rows))
    }
}

/// Validated CSV text. Cheap to iterate repeatedly.
pub struct ParsedTable<'a> {
    content: &'a str,
    options: ReaderOptions,
    columns: ColumnIndex,
}

impl<'a> ParsedTable<'a> {
    pub fn columns(&self) -> &ColumnIndex {
        &self.columns
    }

    /// Fresh iterator over the data rows, header and comment lines excluded
    pub fn rows(&self) -> Rows<'a> {
        Rows {
            records: self.records(),
            pending_header: self.options.has_header,
            next_index: 0,
        }
    }

    fn records(&self) -> StringRecordsIntoIter<&'a [u8]> {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.options.delimiter as u8)
            .quote(self.options.quote as u8)
            .double_quote(true)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::None);
        if let Some(c) = self.options.skip_line_char {
            builder.comment(Some(c as u8));
        }
        builder.from_reader(self.content.as_bytes()).into_records()
    }
}

pub struct Rows<'a> {
    records: StringRecordsIntoIter<&'a [u8]>,
    pending_header: bool,
    next_index: usize,
}

impl Iterator for Rows<'_> {
    type Item = Result<CsvRow, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(malformed(e))),
        };
        if self.pending_header {
            self.pending_header = false;
            return self.next();
        }
        let row = CsvRow::new(self.next_index, record_cells(&record));
        self.next_index += 1;
        Some(Ok(row))
    }
}

fn record_cells(record: &StringRecord) -> Vec<String> {
    record.iter().map(str::to_string).collect()
}

fn malformed(err: csv::Error) -> AppError {
    AppError::MalformedInput(format!("Failed to parse CSV: {}", err))
}

/// The `csv` reader accepts an unterminated quote by reading to the end of
/// input, so quoting is checked separately.
fn check_quoting(content: &str, options: &ReaderOptions) -> Result<(), AppError> {
    let quote = options.quote;
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut at_line_start = true;
    let mut in_comment = false;
    let mut line = 1usize;
    let mut opened_at = 0usize;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == quote {
                if chars.peek() == Some(&quote) {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else if is_line_break(c, chars.peek()) {
                line += 1;
            }
            continue;
        }

        if c == '\r' && chars.peek() == Some(&'\n') {
            continue;
        }
        if c == '\n' || c == '\r' {
            line += 1;
            at_field_start = true;
            at_line_start = true;
            in_comment = false;
            continue;
        }
        if in_comment {
            continue;
        }
        if at_line_start && Some(c) == options.skip_line_char {
            in_comment = true;
            continue;
        }
        at_line_start = false;

        if c == quote && at_field_start {
            in_quotes = true;
            opened_at = line;
            at_field_start = false;
        } else if c == options.delimiter {
            at_field_start = true;
        } else {
            at_field_start = false;
        }
    }

    if in_quotes {
        return Err(AppError::MalformedInput(format!(
            "Unterminated quoted field starting on line {}",
            opened_at
        )));
    }
    Ok(())
}

/// A lone `\r` ends a record like `\n`; `\r\n` counts once, on the `\n`.
fn is_line_break(c: char, next: Option<&char>) -> bool {
    c == '\n' || (c == '\r' && next != Some(&'\n'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str, options: ReaderOptions) -> (ColumnIndex, Vec<CsvRow>) {
        CsvParser::new(options).parse_rows(content).unwrap()
    }

    #[test]
    fn test_parse_simple_csv() {
        let (columns, rows) = parse("name,age,city\nAlice,30,NYC\nBob,25,LA", ReaderOptions::new());

        assert_eq!(rows.len(), 2);
        assert_eq!(columns.headers(), &["name", "age", "city"]);
        assert_eq!(rows[0].cells, vec!["Alice", "30", "NYC"]);
        assert_eq!(rows[1].index, 1);
        assert_eq!(columns.resolve("city"), Some(2));
    }

    #[test]
    fn test_quoted_fields() {
        let content = "a;b\n\"x;y\";\"line one\nline two\"\n\"say \"\"hi\"\"\";z";
        let options = ReaderOptions::new().with_delimiter(';');
        let (_, rows) = parse(content, options);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells, vec!["x;y", "line one\nline two"]);
        assert_eq!(rows[1].cells, vec!["say \"hi\"", "z"]);
    }

    #[test]
    fn test_without_header_uses_letters() {
        let (columns, rows) = parse("Alice,1\nBob,2", ReaderOptions::new().with_header(false));

        assert!(!columns.has_header());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell(columns.resolve("B").unwrap()), Some("1"));
    }

    #[test]
    fn test_unterminated_quote_is_malformed() {
        let parser = CsvParser::default();
        let err = parser
            .parse_rows("name\n\"Alice\nBob")
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_unterminated_quote_with_cr_line_endings() {
        let parser = CsvParser::new(ReaderOptions::new().with_header(false));
        let err = parser.parse_rows("a\r\"b,c\rd").unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(msg) if msg.contains("line 2")));

        let err = parser.parse_rows("a\r\n\"b,c\r\nd").unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_cr_line_endings_parse() {
        let (_, rows) = parse("a,\"x\"\r\"b,c\",d\r\ne", ReaderOptions::new().with_header(false));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].cells, vec!["b,c", "d"]);
        assert_eq!(rows[2].cells, vec!["e"]);
    }

    #[test]
    fn test_blank_lines_are_not_rows() {
        let (_, rows) = parse("Alice\n\nBob", ReaderOptions::new().with_header(false));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].cells, vec!["Bob"]);
        assert_eq!(rows[1].index, 1);
    }

    #[test]
    fn test_skip_line_char() {
        let content = "name\n# a comment with a \" quote\nAlice\n#skipped\nBob";
        let options = ReaderOptions::new().with_skip_line_char(Some('#'));
        let (_, rows) = parse(content, options);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].cells, vec!["Bob"]);
        assert_eq!(rows[1].index, 1);
    }

    #[test]
    fn test_rows_are_restartable() {
        let parser = CsvParser::default();
        let table = parser.parse_content("h\n1\n2\n3").unwrap();

        let first: Vec<CsvRow> = table.rows().map(Result::unwrap).collect();
        let second: Vec<CsvRow> = table.rows().map(Result::unwrap).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_bom_is_stripped() {
        let (columns, _) = parse("\u{feff}name,age\nA,1", ReaderOptions::new());
        assert_eq!(columns.resolve("name"), Some(0));
    }

    #[test]
    fn test_empty_quoted_cell_is_a_row() {
        let (_, rows) = parse("Alice\n\"\"\nBob", ReaderOptions::new().with_header(false));
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_blank());
    }
}
