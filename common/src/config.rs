use std::time::Duration;

pub const DEFAULT_DISCARD_BUDGET: usize = 20;
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_millis(2_000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);
pub const DEFAULT_POISON_INTERVAL: Duration = Duration::from_secs(1);

/// Tunables shared by the listener, scanner and poisoner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How many non-matching frames the reply listener throws away before
    /// giving up on a reply.
    ///
    /// Every received frame counts, including non-ARP traffic and truncated
    /// payloads.
    pub discard_budget: usize,
    /// Wall-clock cap on a single wait for a reply.
    ///
    /// Bounds the wait on a silent link, where the discard budget never
    /// moves.
    pub reply_timeout: Duration,
    /// Read timeout of the underlying datalink channel.
    pub poll_interval: Duration,
    /// Pause after each direction of a poisoning cycle.
    pub poison_interval: Duration,
    /// Re-announce the genuine mappings to both victims once poisoning is
    /// cancelled.
    pub restore_on_stop: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            discard_budget: DEFAULT_DISCARD_BUDGET,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poison_interval: DEFAULT_POISON_INTERVAL,
            restore_on_stop: false,
        }
    }
}
