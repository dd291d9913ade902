//! Expiry Timer Task
//!
//! One-shot background task that fires a callback after a delay.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// Spawns a task that sleeps for `delay` and then runs `on_expire`.
///
/// Returns `None` when called outside a Tokio runtime: there is no timer
/// facility to schedule on, so the caller keeps its entry until it is
/// cleared by hand.
///
/// # Example
/// ```ignore
/// let handle = spawn_expiry_timer(Duration::from_secs(30), move || evict(key));
/// // Later, to cancel:
/// if let Some(handle) = handle { handle.abort(); }
/// ```
pub fn spawn_expiry_timer<F>(delay: Duration, on_expire: F) -> Option<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let runtime = match Handle::try_current() {
        Ok(runtime) => runtime,
        Err(_) => {
            debug!("No async runtime available, expiry timer not scheduled");
            return None;
        }
    };

    Some(runtime.spawn(async move {
        tokio::time::sleep(delay).await;
        on_expire();
    }))
}
