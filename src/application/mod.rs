pub mod use_cases;

pub use use_cases::batch_processor::BatchProcessor;
pub use use_cases::dependency_resolver::{DependencyResolver, EvaluationOrder};
pub use use_cases::mapping_validator::{MappingValidator, ValidatedMapping};
pub use use_cases::record_builder::{BuildOutcome, RecordBuilder, SkipReason};
pub use use_cases::value_extractor::{Extracted, ValueExtractor};
