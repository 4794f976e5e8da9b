//! One task per unit of work, joined before the phase returns.

use crate::utils::error::{Result, SyncError};
use tokio::task::JoinSet;

/// Waits for every task and places each result in its slot.
pub(crate) async fn join_slots<T: Send + 'static>(
    phase: &str,
    mut tasks: JoinSet<(usize, Result<T>)>,
    len: usize,
) -> Result<Vec<T>> {
    let mut slots: Vec<Option<T>> = (0..len).map(|_| None).collect();
    let mut failures = 0usize;
    let mut first_error: Option<SyncError> = None;

    while let Some(joined) = tasks.join_next().await {
        let error = match joined {
            Ok((slot, Ok(value))) => {
                slots[slot] = Some(value);
                continue;
            }
            Ok((_, Err(e))) => e,
            Err(join_error) => SyncError::TaskError {
                message: join_error.to_string(),
            },
        };
        tracing::error!("❌ {} task failed: {}", phase, error);
        failures += 1;
        first_error.get_or_insert(error);
    }

    if let Some(error) = first_error {
        tracing::error!("❌ {} of {} tasks failed during {}", failures, len, phase);
        return Err(error);
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.ok_or_else(|| SyncError::TaskError {
                message: format!("{} left an empty result slot", phase),
            })
        })
        .collect()
}
