use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use encoding_rs::UTF_8;
use tracing::{info, warn};

use crate::application::BatchProcessor;
use crate::domain::error::{AppError, Result};
use crate::domain::record::BatchResult;
use crate::domain::schema::InMemorySchemaRegistry;
use crate::infrastructure::config::{EngineConfig, MappingDocument};

#[derive(Debug, Parser)]
#[command(name = "tablegraph")]
#[command(version, about = "Map CSV rows to entity and relationship records", long_about = None)]
pub struct Cli {
    /// Mapping document (JSON)
    #[arg(short, long)]
    pub mapping: PathBuf,

    /// Attribute definitions per type (JSON object of type name to definitions)
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Engine settings (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Only map the first N rows
    #[arg(long)]
    pub limit: Option<usize>,

    /// Log filter, e.g. `debug` or `tablegraph=trace`
    #[arg(long, default_value = "info")]
    pub log: String,

    /// CSV input
    pub input: PathBuf,
}

pub fn init_tracing(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> Result<BatchResult> {
    init_tracing(&cli.log);

    let config = EngineConfig::load(cli.config.as_deref())?;
    let schema: InMemorySchemaRegistry = serde_json::from_str(&read_text(&cli.schema)?)
        .map_err(|e| AppError::Config(format!("Failed to parse schema: {}", e)))?;
    let document = MappingDocument::from_json(&read_text(&cli.mapping)?)?;
    let reader = document.reader_options(&config.reader);

    let processor = BatchProcessor::new(&schema, config).with_reader_options(reader);
    let mapping = processor.validate(document.into_configuration()?)?;

    let raw = read_text(&cli.input)?;
    info!("Read {} bytes from {}", raw.len(), cli.input.display());
    match cli.limit {
        Some(limit) => processor.preview(&raw, mapping.configuration(), limit),
        None => processor.run(&raw, mapping.configuration()),
    }
}

/// Read a file as text. A UTF-8 or UTF-16 BOM picks the encoding, invalid
/// sequences become U+FFFD.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(decode(&bytes))
}

fn decode(bytes: &[u8]) -> String {
    let (text, encoding, had_errors) = UTF_8.decode(bytes);
    if had_errors {
        warn!("Input is not valid {}; replaced invalid sequences", encoding.name());
    }
    text.into_owned()
}
