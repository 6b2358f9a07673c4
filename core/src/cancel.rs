use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use thiserror::Error;

const SLEEP_TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Raised from outside (Ctrl-C handler, tests) to stop a running session.
pub type CancelFlag = Arc<AtomicBool>;

pub fn new_flag() -> CancelFlag {
    Arc::new(AtomicBool::new(false))
}

pub fn cancel(flag: &CancelFlag) {
    flag.store(true, Ordering::Relaxed);
}

pub fn is_cancelled(flag: &CancelFlag) -> bool {
    flag.load(Ordering::Relaxed)
}

/// Sleeps for `duration`, waking early once the flag is raised.
pub fn cancel_sleep(flag: &CancelFlag, duration: Duration) -> Result<(), Cancelled> {
    let start = Instant::now();
    loop {
        if is_cancelled(flag) {
            return Err(Cancelled);
        }
        let remaining = duration.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            return Ok(());
        }
        std::thread::sleep(SLEEP_TICK.min(remaining));
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
