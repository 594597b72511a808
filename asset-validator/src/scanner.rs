//! Log scanner (C2): adaptive, retrying `eth_getLogs` walker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::{Address, B256};
use eth_node::{EthNode, LogFilter, LogRecord};
use tracing::{debug, info, instrument, warn};

use crate::block_range::AdaptiveBlockRange;
use crate::config::ScanSettings;
use crate::error::{AppError, InfraError};

/// Tunable constants governing batch-size adaptation, mirrored directly
/// from [`ScanSettings`] so the scanner never reaches back into the
/// wider configuration type.
#[derive(Debug, Clone, Copy)]
pub struct ScanConstants {
    /// Target latency per `eth_getLogs` call.
    pub target_time: Duration,
    /// Lower bound on batch size.
    pub min_batch_size: u64,
    /// Upper bound on batch size.
    pub max_batch_size: u64,
    /// Multiplier applied to the latency-derived ratio.
    pub speed_change_factor: f64,
    /// Shrink factor applied on a transient error.
    pub exception_speed_factor: f64,
    /// Maximum ratio by which batch size may change in one step.
    pub max_change_ratio: f64,
    /// Fixed sleep after a node-protocol error.
    pub protocol_error_backoff: Duration,
}

impl Default for ScanConstants {
    /// The §4.2 defaults: 2s target latency, batch size clamped to
    /// `[2, 1_000_000]`, unit speed-change factor, 10x shrink on
    /// transient error, 2x max change ratio, 10s protocol backoff.
    fn default() -> Self {
        Self {
            target_time: Duration::from_secs(2),
            min_batch_size: 2,
            max_batch_size: 1_000_000,
            speed_change_factor: 1.0,
            exception_speed_factor: 0.1,
            max_change_ratio: 2.0,
            protocol_error_backoff: Duration::from_secs(10),
        }
    }
}

impl From<&ScanSettings> for ScanConstants {
    fn from(settings: &ScanSettings) -> Self {
        Self {
            target_time: settings.target_time(),
            min_batch_size: settings.min_batch_size,
            max_batch_size: settings.max_batch_size,
            speed_change_factor: settings.speed_change_factor,
            exception_speed_factor: settings.exception_speed_factor,
            max_change_ratio: settings.max_change_ratio,
            protocol_error_backoff: settings.protocol_error_backoff(),
        }
    }
}

/// Walks `[from, to]`, pulling matching logs in adaptively-sized
/// batches. Call [`LogScanner::next`] repeatedly until it returns
/// `Ok(None)`.
pub struct LogScanner<N: EthNode> {
    node: Arc<N>,
    addresses: Vec<Address>,
    event_signature: Option<B256>,
    range: AdaptiveBlockRange,
    constants: ScanConstants,
    report_progress: bool,
}

impl<N: EthNode> LogScanner<N> {
    /// Build a scanner over `[from, to]` for logs matching `addresses`
    /// and, optionally, `event_signature` (topic 0).
    #[must_use]
    pub fn new(
        node: Arc<N>,
        addresses: Vec<Address>,
        event_signature: Option<B256>,
        from: u64,
        to: u64,
        constants: ScanConstants,
        report_progress: bool,
    ) -> Self {
        let range = AdaptiveBlockRange::new(from, to, constants.min_batch_size, false);
        Self {
            node,
            addresses,
            event_signature,
            range,
            constants,
            report_progress,
        }
    }

    /// Current batch size, exposed mainly for tests.
    #[must_use]
    pub const fn batch_size(&self) -> u64 {
        self.range.step()
    }

    /// Pull the next batch of logs, retrying transient and node-protocol
    /// errors internally. Returns `Ok(None)` once the range is
    /// exhausted.
    ///
    /// # Errors
    /// Propagates any non-retryable, non-protocol node error.
    #[instrument(skip(self), fields(batch_size = self.range.step()))]
    pub async fn next(&mut self) -> Result<Option<Vec<LogRecord>>, AppError> {
        loop {
            let Some(interval) = self.range.next() else {
                return Ok(None);
            };

            let mut filter = LogFilter::new(interval.lo, interval.hi);
            for address in &self.addresses {
                filter = filter.with_address(*address);
            }
            if let Some(sig) = self.event_signature {
                filter = filter.with_event_signature(sig);
            }

            let started = Instant::now();
            match self.node.get_logs(&filter).await {
                Ok(logs) => {
                    self.adapt_batch_size(started.elapsed());
                    if self.report_progress {
                        info!(
                            blocks_scanned = interval.hi,
                            blocks_total = self.range.to(),
                            "log scan progress"
                        );
                    }
                    return Ok(Some(logs));
                }
                Err(err) if err.is_protocol_error() => {
                    warn!(error = %err, lo = interval.lo, hi = interval.hi, "node protocol error, backing off");
                    self.range.set_step(self.constants.min_batch_size);
                    self.range.rollback();
                    tokio::time::sleep(self.constants.protocol_error_backoff).await;
                }
                Err(err) if err.is_retryable() => {
                    debug!(error = %err, lo = interval.lo, hi = interval.hi, "transient error, shrinking batch");
                    let shrunk = (self.range.step() as f64 * self.constants.exception_speed_factor)
                        .max(self.constants.min_batch_size as f64) as u64;
                    self.range.set_step(shrunk);
                    self.range.rollback();
                }
                Err(err) => return Err(AppError::Infra(InfraError::Node(err))),
            }
        }
    }

    fn adapt_batch_size(&mut self, elapsed: Duration) {
        let elapsed_secs = elapsed.as_secs_f64().max(f64::EPSILON);
        let raw_ratio = (self.constants.target_time.as_secs_f64() / elapsed_secs)
            * self.constants.speed_change_factor;
        let clamped_ratio = raw_ratio.clamp(
            1.0 / self.constants.max_change_ratio,
            self.constants.max_change_ratio,
        );

        let new_step = ((self.range.step() as f64) * clamped_ratio)
            .clamp(self.constants.min_batch_size as f64, self.constants.max_batch_size as f64)
            as u64;

        if new_step != self.range.step() {
            self.range.set_step(new_step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eth_node::MockEthNode;

    fn constants() -> ScanConstants {
        ScanConstants {
            target_time: Duration::from_secs(2),
            min_batch_size: 2,
            max_batch_size: 1_000_000,
            speed_change_factor: 1.0,
            exception_speed_factor: 0.1,
            max_change_ratio: 2.0,
            protocol_error_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn exhausted_range_returns_none() {
        let node = Arc::new(MockEthNode::new());
        node.set_logs(0, 10, vec![]);
        let mut scanner = LogScanner::new(node, vec![], None, 0, 10, constants(), false);

        assert!(scanner.next().await.expect("ok").is_some());
        assert!(scanner.next().await.expect("ok").is_none());
    }

    #[tokio::test]
    async fn transient_error_shrinks_batch_and_retries_same_interval() {
        let node = Arc::new(MockEthNode::new());
        node.set_logs(0, 10, vec![]);
        node.fail_logs_transient_once();

        let mut scanner = LogScanner::new(node.clone(), vec![], None, 0, 10, constants(), false);
        let before = scanner.batch_size();
        scanner.next().await.expect("retries through to success");

        // one failed call plus one successful call for the same interval
        assert_eq!(node.get_logs_call_count(), 2);
        assert!(scanner.batch_size() <= before);
    }

    #[tokio::test]
    async fn protocol_error_resets_to_min_batch_and_backs_off() {
        let node = Arc::new(MockEthNode::new());
        node.set_logs(0, 10, vec![]);
        node.fail_logs_protocol_once();

        let mut scanner = LogScanner::new(node, vec![], None, 0, 10, constants(), false);
        scanner.next().await.expect("retries through to success");

        assert_eq!(scanner.batch_size(), constants().min_batch_size.max(2));
    }

    #[tokio::test]
    async fn every_interval_is_observed_exactly_once_despite_failures() {
        let node = Arc::new(MockEthNode::new());
        node.set_logs(0, 49, vec![]);
        node.set_logs(50, 99, vec![]);
        node.fail_logs_transient_once();

        let mut scanner = LogScanner::new(node.clone(), vec![], None, 0, 99, {
            let mut c = constants();
            c.min_batch_size = 50;
            c.max_batch_size = 50;
            c
        }, false);

        let mut seen = 0;
        while scanner.next().await.expect("ok").is_some() {
            seen += 1;
        }
        assert_eq!(seen, 2);
    }
}
