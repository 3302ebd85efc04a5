//! # Batch Planner
//!
//! Splits the member count into fixed-size, offset-addressed batch tasks.

use crate::error::{Result, SyncError};
use crate::models::BatchTask;

/// Number of batches needed to cover `total` members
pub fn round_count(total: i64, batch_size: i64) -> Result<i64> {
    if batch_size <= 0 {
        return Err(SyncError::InvalidBatchSize { batch_size });
    }
    if total < 0 {
        return Err(SyncError::InvalidTotal { total });
    }
    Ok(total / batch_size + i64::from(total % batch_size != 0))
}

/// Plan one task per batch with offsets `0, batch_size, 2 * batch_size, ...`.
///
/// An empty plan means there is nothing to sync; the caller must not start a run.
pub fn plan(total: i64, batch_size: i64) -> Result<Vec<BatchTask>> {
    let rounds = round_count(total, batch_size)?;

    Ok((0..rounds)
        .map(|round| BatchTask::new(round * batch_size, batch_size, total))
        .collect())
}
