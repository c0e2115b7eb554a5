pub mod error;
pub mod mapping;
pub mod record;
pub mod schema;

// CSV row and reader types
pub mod csv;
