//! Index-owned result collection.
//!
//! Every slot is reserved before dispatch and written at most once, by the
//! single worker that owns the index. Writes need no lock; the scheduler's
//! completion barrier makes them visible to the caller.

use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};
use crate::types::ProcessResult;

/// Pre-sized, write-once result slots shared by all workers of a batch
#[derive(Clone, Debug)]
pub struct ResultSlots {
    slots: Arc<Vec<OnceLock<ProcessResult>>>,
}

impl ResultSlots {
    /// Reserve one empty slot per input
    pub fn with_len(len: usize) -> Self {
        Self {
            slots: Arc::new((0..len).map(|_| OnceLock::new()).collect()),
        }
    }

    /// Number of reserved slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the batch has no items
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Record `result` in the slot named by its index
    pub fn fill(&self, result: ProcessResult) -> Result<()> {
        let index = result.index;
        let slot = self.slots.get(index).ok_or(Error::SlotOutOfRange {
            index,
            len: self.slots.len(),
        })?;
        slot.set(result).map_err(|_| Error::SlotAlreadyFilled { index })
    }

    /// Number of slots written so far
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.get().is_some()).count()
    }

    /// Collect the results in index order
    ///
    /// Must be called after every worker has finished. A slot nobody wrote is
    /// reported as a lost worker for the matching input.
    pub fn into_results(self, inputs: &[String]) -> Vec<ProcessResult> {
        let slots: Vec<Option<ProcessResult>> = match Arc::try_unwrap(self.slots) {
            Ok(slots) => slots.into_iter().map(OnceLock::into_inner).collect(),
            // A clone outlived the barrier; copy what is there.
            Err(shared) => shared.iter().map(|s| s.get().cloned()).collect(),
        };

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    let input = inputs.get(index).cloned().unwrap_or_default();
                    ProcessResult::lost(index, input, "no result recorded")
                })
            })
            .collect()
    }
}
