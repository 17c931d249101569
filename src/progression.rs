//! Sequential unlock model.
//!
//! Every function here is pure: it takes a snapshot of a [`CompletionRecord`]
//! and returns a value or a new record. Persisting results is the caller's job.
//!
//! Entity `0` of a sequence is always accessible. Entity `i > 0` is
//! accessible iff entity `i - 1` is completed. The `unlocked` flag is kept
//! in step by [`mark_completed`] for stores and older readers, but it never
//! decides accessibility.
//!
//! Invalid input (out-of-range index, unknown id) is a caller bug. The
//! `try_*` functions report it as a [`ProgressError`]; the plain functions
//! panic in debug builds and fall back to `false` / an unchanged record in
//! release builds.

use crate::error::ProgressError;
use crate::record::CompletionRecord;
use crate::sequence::OrderedSequence;
use tracing::warn;

pub fn try_is_accessible(
    sequence: &OrderedSequence,
    record: &CompletionRecord,
    index: usize,
) -> Result<bool, ProgressError> {
    if index >= sequence.len() {
        return Err(ProgressError::IndexOutOfRange {
            index,
            len: sequence.len(),
        });
    }
    if index == 0 {
        return Ok(true);
    }
    // index - 1 is in range whenever index is
    let previous = sequence.get(index - 1).unwrap_or_default();
    Ok(record.is_completed(previous))
}

pub fn is_accessible(sequence: &OrderedSequence, record: &CompletionRecord, index: usize) -> bool {
    match try_is_accessible(sequence, record, index) {
        Ok(accessible) => accessible,
        Err(err) => {
            debug_assert!(false, "is_accessible: {}", err);
            warn!(%err, "is_accessible called with invalid index");
            false
        }
    }
}

/// Lock map for a whole sequence, one flag per entity in order.
pub fn accessibility(sequence: &OrderedSequence, record: &CompletionRecord) -> Vec<bool> {
    (0..sequence.len())
        .map(|i| is_accessible(sequence, record, i))
        .collect()
}

/// Share of completed entities, rounded to the nearest whole percent.
///
/// An empty sequence is 0% complete.
pub fn completion_percent(sequence: &OrderedSequence, record: &CompletionRecord) -> u8 {
    let total = sequence.len();
    if total == 0 {
        return 0;
    }
    let completed = sequence.iter().filter(|id| record.is_completed(id)).count();
    ratio_percent(completed, total)
}

/// `round(100 * part / total)` with halves rounded up, in integer arithmetic.
pub(crate) fn ratio_percent(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let part = part.min(total) as u64;
    let total = total as u64;
    ((200 * part + total) / (2 * total)) as u8
}

/// Whether every entity of `sequence` is completed. Vacuously true for an
/// empty sequence.
///
/// Gate on this rather than on `completion_percent(..) == 100`: the rounded
/// percent reaches 100 one entity early once a sequence has 200 entries.
pub fn all_completed(sequence: &OrderedSequence, record: &CompletionRecord) -> bool {
    sequence.iter().all(|id| record.is_completed(id))
}

/// First entity that is accessible but not yet completed.
pub fn current_entity<'a>(
    sequence: &'a OrderedSequence,
    record: &CompletionRecord,
) -> Option<&'a str> {
    sequence
        .iter()
        .enumerate()
        .find(|(i, id)| !record.is_completed(id) && is_accessible(sequence, record, *i))
        .map(|(_, id)| id)
}

pub fn try_mark_completed(
    record: &CompletionRecord,
    entity_id: &str,
    sequence: &OrderedSequence,
) -> Result<CompletionRecord, ProgressError> {
    if sequence.position(entity_id).is_none() {
        return Err(ProgressError::UnknownEntity(entity_id.to_string()));
    }

    let mut updated = record.clone();
    updated.entry_mut(entity_id).complete();
    if let Some(next) = sequence.successor(entity_id) {
        updated.entry_mut(next).unlock();
    }
    Ok(updated)
}

/// Returns a copy of `record` with `entity_id` completed and its successor
/// unlocked.
pub fn mark_completed(
    record: &CompletionRecord,
    entity_id: &str,
    sequence: &OrderedSequence,
) -> CompletionRecord {
    match try_mark_completed(record, entity_id, sequence) {
        Ok(updated) => updated,
        Err(err) => {
            debug_assert!(false, "mark_completed: {}", err);
            warn!(%err, "mark_completed called with unknown entity");
            record.clone()
        }
    }
}
