//! Cancel-and-reschedule timer for keystroke-driven requests.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Runs only the most recently scheduled operation, once its delay has
/// passed without another `schedule` call. An operation that has started is
/// never cancelled.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F, Fut>(&mut self, delay: Duration, op: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached so a later cancel() cannot abort the request itself.
            tokio::spawn(op());
        }));
    }

    /// Drop the pending timer, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};

    type Op = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn push(log: &Arc<Mutex<Vec<u32>>>, n: u32) -> impl FnOnce() -> Op + Send + 'static {
        let log = Arc::clone(log);
        move || -> Op { Box::pin(async move { log.lock().unwrap().push(n) }) }
    }

    #[tokio::test(start_paused = true)]
    async fn only_last_scheduled_operation_runs() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new();
        debouncer.schedule(Duration::from_millis(300), push(&log, 1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(Duration::from_millis(300), push(&log, 2));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(Duration::from_millis(300), push(&log, 3));
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(*log.lock().unwrap(), vec![3]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_pending_operation() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new();
        debouncer.schedule(Duration::from_millis(300), push(&log, 1));
        debouncer.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn started_operation_survives_cancel() {
        let finished = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&finished);
        let mut debouncer = Debouncer::new();
        debouncer.schedule(Duration::from_millis(10), move || async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            *flag.lock().unwrap() = true;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(*finished.lock().unwrap());
    }
}
