use monitor_core::{MonitorError, Result, ViolationRecord};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Create the bounded queue between source workers and the export worker.
pub fn violation_channel(capacity: usize) -> (ViolationSender, ViolationReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ViolationSender { tx }, ViolationReceiver { rx })
}

/// Producer side, cloned into every source worker.
#[derive(Clone)]
pub struct ViolationSender {
    tx: mpsc::Sender<ViolationRecord>,
}

impl ViolationSender {
    /// Enqueue without waiting. A full queue hands the error back to the
    /// caller, which drops the record.
    pub fn offer(&self, record: ViolationRecord) -> Result<()> {
        self.tx.try_send(record).map_err(|e| match e {
            TrySendError::Full(record) => MonitorError::ChannelFull(record.id),
            TrySendError::Closed(_) => MonitorError::ChannelClosed,
        })
    }
}

/// Consumer side, owned by the export worker.
pub struct ViolationReceiver {
    rx: mpsc::Receiver<ViolationRecord>,
}

impl ViolationReceiver {
    pub async fn recv(&mut self) -> Option<ViolationRecord> {
        self.rx.recv().await
    }

    /// Refuse further offers; queued records stay readable.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::{Comparison, MetricSample, SourceKind, ThresholdRule};

    fn record() -> ViolationRecord {
        let rule = ThresholdRule::new("app", "x", Comparison::GreaterThan, 1.0);
        let sample = MetricSample::from_pairs([("x", 2.0)]);
        ViolationRecord::from_rule(&rule, &sample, SourceKind::JsonFile).unwrap()
    }

    #[tokio::test]
    async fn test_offer_reports_full_without_blocking() {
        let (tx, mut rx) = violation_channel(2);
        tx.offer(record()).unwrap();
        tx.offer(record()).unwrap();
        assert!(matches!(tx.offer(record()), Err(MonitorError::ChannelFull(_))));

        assert!(rx.recv().await.is_some());
        tx.offer(record()).unwrap();
    }

    #[tokio::test]
    async fn test_close_keeps_queued_records() {
        let (tx, mut rx) = violation_channel(4);
        tx.offer(record()).unwrap();
        rx.close();

        assert!(matches!(tx.offer(record()), Err(MonitorError::ChannelClosed)));
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }
}
