// ============================================================
// BATCH PROCESSOR
// ============================================================
// Parse once, resolve once, then build every row independently

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::dependency_resolver::{DependencyResolver, EvaluationOrder};
use super::mapping_validator::{MappingValidator, ValidatedMapping};
use super::record_builder::{BuildOutcome, RecordBuilder};
use super::row_scratch::{RowScratch, SlotState};
use super::value_extractor::{RowContext, ValueExtractor};
use crate::domain::csv::{ColumnIndex, CsvRow, ReaderOptions};
use crate::domain::error::{Result, RowError};
use crate::domain::mapping::MappingConfiguration;
use crate::domain::record::{BatchResult, BatchSummary, LogicalRecord, RowOutcome};
use crate::domain::schema::SchemaRegistry;
use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::csv::CsvParser;

pub struct BatchProcessor<'s> {
    schema: &'s dyn SchemaRegistry,
    config: EngineConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'s> BatchProcessor<'s> {
    pub fn new(schema: &'s dyn SchemaRegistry, config: EngineConfig) -> Self {
        Self {
            schema,
            config,
            cancel: None,
        }
    }

    /// Override the reader settings, e.g. with those a mapping document carries.
    pub fn with_reader_options(mut self, reader: ReaderOptions) -> Self {
        self.config.reader = reader;
        self
    }

    /// Abort flag, checked between rows only.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load-time validation against the schema registry.
    pub fn validate(&self, configuration: MappingConfiguration) -> Result<ValidatedMapping> {
        MappingValidator::new(self.schema, self.config.mapping.clone()).validate(configuration)
    }

    /// Map every row of `raw` through `configuration`.
    ///
    /// Structural CSV errors and unresolvable configurations fail the call
    /// before any row is built. Row-level failures never do.
    pub fn run(&self, raw: &str, configuration: &MappingConfiguration) -> Result<BatchResult> {
        self.process(raw, configuration, None)
    }

    /// Same as [`run`](Self::run) over the first `limit` rows.
    pub fn preview(
        &self,
        raw: &str,
        configuration: &MappingConfiguration,
        limit: usize,
    ) -> Result<BatchResult> {
        self.process(raw, configuration, Some(limit))
    }

    fn process(
        &self,
        raw: &str,
        configuration: &MappingConfiguration,
        limit: Option<usize>,
    ) -> Result<BatchResult> {
        let parser = CsvParser::new(self.config.reader.clone());
        let (columns, rows) = parser.parse_rows(raw)?;
        let order = DependencyResolver::order(configuration)?;

        info!(
            "Mapping {} rows with '{}' ({} representations)",
            rows.len(),
            configuration.name,
            order.len()
        );

        let builder = RecordBuilder::new(
            self.schema,
            ValueExtractor::new(
                &self.config.coercion,
                &self.config.mapping.default_list_separator,
            ),
        );

        let mut outcomes = Vec::with_capacity(rows.len());
        let mut cancelled = false;
        for row in rows.iter().take(limit.unwrap_or(usize::MAX)) {
            if self.is_cancelled() {
                warn!("Batch cancelled after {} rows", outcomes.len());
                cancelled = true;
                break;
            }
            outcomes.push(process_row(&builder, &order, &columns, row));
        }

        let result = fold(outcomes, cancelled);
        info!(
            "Batch done: {} rows, {} succeeded, {} failed, {} unique records",
            result.summary.total_rows,
            result.summary.succeeded_rows,
            result.summary.failed_rows,
            result.summary.unique_records
        );
        Ok(result)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}

/// Build one row. Failures are caught per representation; dependents of a
/// failed representation fail in turn while independent ones still build.
fn process_row(
    builder: &RecordBuilder<'_>,
    order: &EvaluationOrder<'_>,
    columns: &ColumnIndex,
    row: &CsvRow,
) -> RowOutcome {
    let mut scratch = RowScratch::new(order);
    let mut error = RowError::default();

    for (slot, representation) in order.iter().enumerate() {
        let result = {
            let ctx = RowContext {
                row,
                columns,
                prior: &scratch,
            };
            builder.build(representation, &ctx)
        };
        let state = match result {
            Ok(BuildOutcome::Built(record)) => SlotState::Built(record),
            Ok(BuildOutcome::Skipped(reason)) => {
                debug!("Row {}: skipped '{}' ({:?})", row.index, representation.id(), reason);
                SlotState::Skipped
            }
            Err(e) => {
                debug!("Row {}: '{}' failed: {}", row.index, representation.id(), e);
                error.push(representation.id(), e);
                SlotState::Failed
            }
        };
        scratch.set(slot, state);
    }

    RowOutcome {
        row_index: row.index,
        produced_records: scratch.into_records(),
        error: (!error.is_empty()).then_some(error),
    }
}

/// Fold records sharing a computed key, keeping first-seen order.
fn fold(outcomes: Vec<RowOutcome>, cancelled: bool) -> BatchResult {
    let mut records: Vec<LogicalRecord> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for outcome in &outcomes {
        for record in &outcome.produced_records {
            match positions.get(record.computed_key.as_str()) {
                Some(&pos) => {
                    let rows = &mut records[pos].contributing_rows;
                    if rows.last() != Some(&outcome.row_index) {
                        rows.push(outcome.row_index);
                    }
                }
                None => {
                    positions.insert(record.computed_key.as_str(), records.len());
                    records.push(LogicalRecord {
                        computed_key: record.computed_key.clone(),
                        record: record.clone(),
                        contributing_rows: vec![outcome.row_index],
                    });
                }
            }
        }
    }

    let failed_rows = outcomes.iter().filter(|o| !o.is_success()).count();
    let summary = BatchSummary {
        total_rows: outcomes.len(),
        succeeded_rows: outcomes.len() - failed_rows,
        failed_rows,
        unique_records: records.len(),
        cancelled,
    };

    BatchResult {
        outcomes,
        records,
        summary,
    }
}
