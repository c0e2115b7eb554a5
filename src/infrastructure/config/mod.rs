mod engine_config;
mod mapping_loader;

pub use engine_config::{CoercionOptions, ConfigValidation, EngineConfig, MappingOptions, ENV_PREFIX};
pub use mapping_loader::MappingDocument;
