use std::time::Duration;

use gaff_graph::RetryBackoff;

/// Backoff delay before attempt `attempt` (1-based):
/// `exponential ⇒ min(2^attempt * 1000ms, 30s)`, `linear ⇒ min(attempt *
/// 1000ms, 10s)`. `constant` is a pragmatic addition beyond the two,
/// holding at a flat second.
pub fn delay_for(backoff: RetryBackoff, attempt: u32) -> Duration {
  let ms = match backoff {
    RetryBackoff::Exponential => (2u64.saturating_pow(attempt).saturating_mul(1000)).min(30_000),
    RetryBackoff::Linear => (attempt as u64 * 1000).min(10_000),
    RetryBackoff::Constant => 1_000,
  };
  Duration::from_millis(ms)
}
