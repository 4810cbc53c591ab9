use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

use super::payloads::GatewayPayload;
use super::session::load_sequence;

/// Periodic heartbeat task. Frames go to the connection's single writer
/// through `payload_tx`; the task never touches the socket itself.
pub struct HeartbeatManager {
    interval: Duration,
    sequence: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    ack_received: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatManager {
    #[must_use]
    pub fn new(interval_ms: u64, sequence: Arc<AtomicU64>) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            sequence,
            running: Arc::new(AtomicBool::new(false)),
            ack_received: Arc::new(AtomicBool::new(true)),
            handle: None,
        }
    }

    /// Spawns the loop: first beat one full interval from now, then one per
    /// interval until stopped.
    pub fn start(&mut self, payload_tx: mpsc::Sender<GatewayPayload>) {
        let interval = self.interval;
        let sequence = Arc::clone(&self.sequence);
        let running = Arc::clone(&self.running);
        let ack_received = Arc::clone(&self.ack_received);

        running.store(true, Ordering::SeqCst);

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;

                if !running.load(Ordering::SeqCst) {
                    break;
                }

                if !ack_received.swap(false, Ordering::SeqCst) {
                    warn!("Heartbeat ACK not received, connection may be dead");
                }

                let seq = load_sequence(&sequence);
                if payload_tx.send(GatewayPayload::heartbeat(seq)).await.is_err() {
                    debug!("Heartbeat channel closed");
                    break;
                }
                debug!(sequence = ?seq, "Queued heartbeat");
            }

            debug!("Heartbeat loop stopped");
        }));
    }

    pub fn acknowledge(&self) {
        self.ack_received.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops the loop immediately; no frame is queued afterwards.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for HeartbeatManager {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_one_heartbeat_per_interval() {
        let sequence = Arc::new(AtomicU64::new(0));
        let (tx, mut rx) = mpsc::channel(16);
        let mut manager = HeartbeatManager::new(100, Arc::clone(&sequence));
        manager.start(tx);

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(rx.try_recv().unwrap(), GatewayPayload::heartbeat(None));

        sequence.store(7, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(rx.try_recv().unwrap(), GatewayPayload::heartbeat(Some(7)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_heartbeat_after_stop() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut manager = HeartbeatManager::new(50, Arc::new(AtomicU64::new(0)));
        manager.start(tx);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(rx.try_recv().is_ok());

        manager.stop();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }
}
