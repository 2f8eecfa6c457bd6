use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub type TaskFuture = BoxFuture<'static, ()>;
pub type RepeatingTask = Box<dyn FnMut() -> TaskFuture + Send + 'static>;

/// Periodic and one-shot callbacks. Every callback runs to completion before
/// the same task ticks again.
pub trait Scheduler: Send + Sync {
    /// Runs `task` every `interval`, first after one full interval.
    fn schedule(&self, interval: Duration, task: RepeatingTask) -> TaskHandle;
    fn schedule_once(&self, delay: Duration, task: TaskFuture) -> TaskHandle;
}

/// Cancels its task when cancelled or dropped. Cancelling twice is fine.
#[derive(Debug)]
pub struct TaskHandle {
    token: CancellationToken,
}

impl TaskHandle {
    fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, interval: Duration, mut task: RepeatingTask) -> TaskHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if cancelled.is_cancelled() {
                            break;
                        }
                        task().await;
                    }
                    _ = cancelled.cancelled() => break,
                }
            }
        });

        TaskHandle::new(token)
    }

    fn schedule_once(&self, delay: Duration, task: TaskFuture) -> TaskHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(delay) => {
                    if !cancelled.is_cancelled() {
                        task.await;
                    }
                }
                _ = cancelled.cancelled() => {}
            }
        });

        TaskHandle::new(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: &Arc<AtomicU32>) -> RepeatingTask {
        let counter = counter.clone();
        Box::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_task_ticks_until_cancelled() {
        let counter = Arc::new(AtomicU32::new(0));
        let handle = TokioScheduler.schedule(Duration::from_secs(1), counting_task(&counter));

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        handle.cancel();
        handle.cancel();
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_one_shot_never_fires() {
        let counter = Arc::new(AtomicU32::new(0));
        let fired = counter.clone();
        let handle = TokioScheduler.schedule_once(
            Duration::from_secs(2),
            async move {
                fired.fetch_add(1, Ordering::SeqCst);
            }
            .boxed(),
        );
        drop(handle);

        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
