// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Tabular reader over in-memory CSV text

mod csv_parser;

pub use csv_parser::{CsvParser, ParsedTable, Rows};
