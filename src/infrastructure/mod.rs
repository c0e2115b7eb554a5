pub mod config;
pub mod csv;
pub mod date_pattern;
pub mod hashing;
