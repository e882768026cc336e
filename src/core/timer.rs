// Cancellable tick scheduling: a virtual clock for tests, tokio tasks for real use

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one scheduled tick. Ids are never reused by a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

pub trait TickScheduler: Send {
    /// Arranges for `id` to be delivered once `delay` has elapsed.
    fn schedule(&mut self, delay: Duration) -> TickId;

    /// A cancelled tick is never delivered.
    fn cancel(&mut self, id: TickId);
}

/// Virtual clock. Nothing fires until `advance` moves time forward.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    pending: Vec<(TickId, Duration)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Moves the clock forward and returns the ticks that came due, oldest first.
    pub fn advance(&mut self, by: Duration) -> Vec<TickId> {
        self.now += by;
        let now = self.now;
        let mut due: Vec<(TickId, Duration)> = Vec::new();
        self.pending.retain(|&(id, deadline)| {
            if deadline <= now {
                due.push((id, deadline));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(id, deadline)| (deadline, id));
        due.into_iter().map(|(id, _)| id).collect()
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TickId {
        let id = TickId(self.next_id);
        self.next_id += 1;
        self.pending.push((id, self.now + delay));
        id
    }

    fn cancel(&mut self, id: TickId) {
        self.pending.retain(|&(pending, _)| pending != id);
    }
}

/// Each tick is a tokio task that sleeps and then sends its id on `ticks`.
/// Outstanding tasks are aborted on cancel and when the scheduler is dropped.
#[derive(Debug)]
pub struct TokioTickScheduler {
    ticks: mpsc::UnboundedSender<TickId>,
    tasks: HashMap<TickId, JoinHandle<()>>,
    next_id: u64,
}

impl TokioTickScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TickId>) {
        let (ticks, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            ticks,
            tasks: HashMap::new(),
            next_id: 0,
        };
        (scheduler, rx)
    }
}

impl TickScheduler for TokioTickScheduler {
    fn schedule(&mut self, delay: Duration) -> TickId {
        let id = TickId(self.next_id);
        self.next_id += 1;

        self.tasks.retain(|_, task| !task.is_finished());

        let ticks = self.ticks.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = ticks.send(id);
        });
        self.tasks.insert(id, task);
        id
    }

    fn cancel(&mut self, id: TickId) {
        if let Some(task) = self.tasks.remove(&id) {
            task.abort();
        }
    }
}

impl Drop for TokioTickScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_scheduler_fires_in_order() {
        let mut scheduler = ManualScheduler::new();
        let late = scheduler.schedule(Duration::from_millis(500));
        let early = scheduler.schedule(Duration::from_millis(100));

        assert!(scheduler.advance(Duration::from_millis(99)).is_empty());
        assert_eq!(scheduler.advance(Duration::from_millis(1)), vec![early]);
        assert_eq!(scheduler.advance(Duration::from_secs(1)), vec![late]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_manual_scheduler_cancel() {
        let mut scheduler = ManualScheduler::new();
        let id = scheduler.schedule(Duration::from_millis(10));
        scheduler.cancel(id);
        assert!(scheduler.advance(Duration::from_secs(1)).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_delivers_after_delay() {
        let (mut scheduler, mut rx) = TokioTickScheduler::new();
        let id = scheduler.schedule(Duration::from_millis(350));

        tokio::time::sleep(Duration::from_millis(349)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(rx.recv().await, Some(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_cancel_and_drop() {
        let (mut scheduler, mut rx) = TokioTickScheduler::new();
        let cancelled = scheduler.schedule(Duration::from_millis(350));
        scheduler.cancel(cancelled);
        let _dropped = scheduler.schedule(Duration::from_millis(350));
        drop(scheduler);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(rx.recv().await, None);
    }
}
