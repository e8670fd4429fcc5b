//! Trailing-edge debouncing on a tokio task.
//!
//! [`Debouncer::call`] never blocks. Each call restarts the quiet period and
//! replaces the pending arguments; when the period elapses without another
//! call the callback runs once with the most recent arguments. Dropping the
//! debouncer (or awaiting [`Debouncer::finish`]) runs a pending call right
//! away instead of losing it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::trace;

pub struct Debouncer<A> {
    tx: mpsc::UnboundedSender<A>,
    task: JoinHandle<()>,
}

impl<A: Send + 'static> Debouncer<A> {
    /// Spawns the timer task. Must be called inside a tokio runtime.
    pub fn new<F>(
        delay: Duration,
        mut callback: F,
    ) -> Self
    where
        F: FnMut(A) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<A>();
        let task = tokio::spawn(async move {
            let mut pending: Option<A> = None;
            loop {
                let Some(args) = pending.take() else {
                    match rx.recv().await {
                        Some(args) => pending = Some(args),
                        None => break,
                    }
                    continue;
                };
                tokio::select! {
                    next = rx.recv() => match next {
                        Some(newer) => pending = Some(newer),
                        None => {
                            trace!("debouncer closed, flushing pending call");
                            callback(args);
                            break;
                        }
                    },
                    _ = sleep(delay) => callback(args),
                }
            }
        });
        Self { tx, task }
    }

    /// Schedules `args`, superseding any call still waiting.
    pub fn call(
        &self,
        args: A,
    ) {
        if self.tx.send(args).is_err() {
            trace!("debouncer task has stopped, call dropped");
        }
    }

    /// Runs any pending call now and waits for it to complete.
    pub async fn finish(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            tracing::error!(error = %e, "debouncer task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;

    const DELAY: Duration = Duration::from_millis(250);

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl FnMut(u32) + Send + 'static) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |n| sink.lock().unwrap().push(n))
    }

    fn recorded(calls: &Arc<Mutex<Vec<u32>>>) -> Vec<u32> {
        calls.lock().unwrap().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn burst_fires_once_with_last_arguments() {
        let (calls, callback) = recorder();
        let debouncer = Debouncer::new(DELAY, callback);

        for n in 1..=5 {
            debouncer.call(n);
        }
        sleep(Duration::from_millis(300)).await;

        assert_eq!(recorded(&calls), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_before_quiet_period() {
        let (calls, callback) = recorder();
        let debouncer = Debouncer::new(DELAY, callback);

        debouncer.call(1);
        sleep(Duration::from_millis(200)).await;

        assert_eq!(recorded(&calls), Vec::<u32>::new());
    }

    #[tokio::test(start_paused = true)]
    async fn each_call_restarts_the_timer() {
        let (calls, callback) = recorder();
        let debouncer = Debouncer::new(DELAY, callback);

        debouncer.call(1);
        sleep(Duration::from_millis(200)).await;
        debouncer.call(2);
        sleep(Duration::from_millis(200)).await;
        assert_eq!(recorded(&calls), Vec::<u32>::new());

        sleep(Duration::from_millis(100)).await;
        assert_eq!(recorded(&calls), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn separated_calls_each_fire() {
        let (calls, callback) = recorder();
        let debouncer = Debouncer::new(DELAY, callback);

        debouncer.call(1);
        sleep(Duration::from_millis(300)).await;
        debouncer.call(2);
        sleep(Duration::from_millis(300)).await;

        assert_eq!(recorded(&calls), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn finish_flushes_pending_call() {
        let (calls, callback) = recorder();
        let debouncer = Debouncer::new(DELAY, callback);

        debouncer.call(7);
        debouncer.call(8);
        debouncer.finish().await;

        assert_eq!(recorded(&calls), vec![8]);
    }

    #[tokio::test(start_paused = true)]
    async fn finish_without_pending_call_does_nothing() {
        let (calls, callback) = recorder();
        let debouncer = Debouncer::new(DELAY, callback);

        debouncer.finish().await;

        assert_eq!(recorded(&calls), Vec::<u32>::new());
    }
}
