use super::dependency_resolver::EvaluationOrder;
use crate::domain::record::BuiltRecord;

/// What happened to a representation in the current row.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotState {
    Pending,
    Built(BuiltRecord),
    Skipped,
    Failed,
}

static PENDING: SlotState = SlotState::Pending;

/// Per-row records, indexed by evaluation slot. Created fresh for every row.
pub struct RowScratch<'o, 'a> {
    order: &'o EvaluationOrder<'a>,
    slots: Vec<SlotState>,
}

impl<'o, 'a> RowScratch<'o, 'a> {
    pub fn new(order: &'o EvaluationOrder<'a>) -> Self {
        Self {
            order,
            slots: vec![SlotState::Pending; order.len()],
        }
    }

    pub fn state(&self, representation_id: &str) -> &SlotState {
        self.order
            .slot(representation_id)
            .and_then(|slot| self.slots.get(slot))
            .unwrap_or(&PENDING)
    }

    pub fn record(&self, representation_id: &str) -> Option<&BuiltRecord> {
        match self.state(representation_id) {
            SlotState::Built(record) => Some(record),
            _ => None,
        }
    }

    pub fn set(&mut self, slot: usize, state: SlotState) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = state;
        }
    }

    /// Built records in evaluation order
    pub fn into_records(self) -> Vec<BuiltRecord> {
        self.slots
            .into_iter()
            .filter_map(|state| match state {
                SlotState::Built(record) => Some(record),
                _ => None,
            })
            .collect()
    }
}
