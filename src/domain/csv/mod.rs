// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Row types and reader options
// No I/O, no external dependencies beyond serde

mod csv_row;
mod reader_options;

pub use csv_row::{column_letters_to_index, ColumnIndex, CsvRow};
pub use reader_options::ReaderOptions;
