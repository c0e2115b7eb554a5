pub mod batch_processor;
pub mod dependency_resolver;
pub mod mapping_validator;
pub mod record_builder;
pub mod row_scratch;
pub mod value_extractor;
