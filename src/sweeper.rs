use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::storage::{Storage, SWEEP_BATCH_SIZE};

const FAILURES_BEFORE_COOLDOWN: u32 = 3;
const COOLDOWN_INTERVALS: u32 = 10;

#[derive(Debug, Default)]
pub struct SweepMetrics {
    pub success: bool,
    pub deleted_count: u64,
    pub errors: Vec<String>,
}

/// One sweep: take the cross-process lock, delete expired notes in batches
/// until a batch comes back short, release the lock no matter what happened
/// in between. Losing the lock race is a normal no-op.
pub fn run_sweep(storage: &dyn Storage) -> SweepMetrics {
    let mut metrics = SweepMetrics::default();

    let mut session = match storage.begin_sweep() {
        Ok(Some(session)) => session,
        Ok(None) => {
            log::debug!("sweep skipped, another sweep is in progress");
            metrics.success = true;
            return metrics;
        }
        Err(err) => {
            metrics.errors.push(format!("failed to start sweep: {}", err));
            return metrics;
        }
    };

    let cutoff = SystemTime::now();
    let mut total: u64 = 0;
    let mut batch_error = None;
    loop {
        match session.delete_expired_batch(cutoff, SWEEP_BATCH_SIZE) {
            Ok(deleted) => {
                total += deleted as u64;
                if (deleted as i64) < SWEEP_BATCH_SIZE {
                    break;
                }
            }
            Err(err) => {
                batch_error = Some(format!("sweep batch failed: {}", err));
                break;
            }
        }
    }

    let cleanup_errors = session.finish();

    metrics.deleted_count = total;
    metrics.success = batch_error.is_none();
    if let Some(err) = batch_error {
        metrics.errors.push(err);
    }
    metrics.errors.extend(cleanup_errors);

    if total > 0 {
        log::info!("sweep deleted {} expired notes", total);
    }
    metrics
}

/// Fixed-interval scheduler, run on its own thread. Repeated failures back
/// off for a while instead of hammering a broken backend; the service keeps
/// working either way since retrieval expires notes lazily on its own.
pub fn sweep_loop(storage: Arc<dyn Storage>, interval: Duration) {
    let mut consecutive_failures: u32 = 0;
    loop {
        std::thread::sleep(interval);
        let metrics = run_sweep(storage.as_ref());
        if metrics.success {
            consecutive_failures = 0;
            continue;
        }
        consecutive_failures += 1;
        log::error!(
            "sweep failed ({} in a row): {}",
            consecutive_failures,
            metrics.errors.join("; ")
        );
        if consecutive_failures >= FAILURES_BEFORE_COOLDOWN {
            log::warn!("pausing the sweeper to let the backend recover");
            std::thread::sleep(interval * COOLDOWN_INTERVALS);
            consecutive_failures = 0;
        }
    }
}
