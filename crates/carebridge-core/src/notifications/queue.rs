use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::debug;

use super::{Notification, NotificationError, NotificationId, NotificationKind};

/// Default notification lifetime.
/// Long enough to read a sentence, short enough not to pile up.
pub const DEFAULT_EXPIRY_MS: i64 = 5000;

struct QueueState {
    /// Insertion order is display order
    items: Vec<Notification>,
    /// One pending expiry per expiring notification
    timers: HashMap<NotificationId, AbortHandle>,
    snapshots: watch::Sender<Vec<Notification>>,
}

impl QueueState {
    fn remove_item(&mut self, id: NotificationId) -> bool {
        match self.items.iter().position(|n| n.id == id) {
            Some(index) => {
                // Vec::remove shifts, so survivors keep their order
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.items.clone());
    }
}

/// Ordered notification queue with independent per-notification expiry.
///
/// Expiry timers are Tokio tasks holding only a weak reference to the queue
/// state. Dropping the queue aborts every pending timer.
pub struct NotificationQueue {
    state: Arc<Mutex<QueueState>>,
    default_expiry_ms: i64,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::with_default_expiry(DEFAULT_EXPIRY_MS)
    }

    /// Create a queue whose convenience methods use `default_expiry_ms`
    pub fn with_default_expiry(default_expiry_ms: i64) -> Self {
        let (snapshots, _) = watch::channel(Vec::new());
        Self {
            state: Arc::new(Mutex::new(QueueState {
                items: Vec::new(),
                timers: HashMap::new(),
                snapshots,
            })),
            default_expiry_ms,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn default_expiry_ms(&self) -> i64 {
        self.default_expiry_ms
    }

    /// Append a notification and return its id.
    ///
    /// With `expiry_ms > 0` a one-shot timer removes it later through the same
    /// path as `remove`. Expiring notifications must be enqueued from inside a
    /// Tokio runtime.
    pub fn enqueue(
        &self,
        message: impl Into<String>,
        kind: NotificationKind,
        expiry_ms: i64,
    ) -> Result<NotificationId, NotificationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(NotificationError::EmptyMessage);
        }

        let runtime = if expiry_ms > 0 {
            Some(Handle::try_current().map_err(|_| NotificationError::NoRuntime)?)
        } else {
            None
        };

        let id = NotificationId::new();
        let mut state = self.lock();
        state.items.push(Notification {
            id,
            message,
            kind,
            expiry_ms,
            created_at: Utc::now(),
        });

        // Spawned under the lock, so the timer cannot run before the insert lands
        if let Some(runtime) = runtime {
            let state_ref = Arc::downgrade(&self.state);
            let timer = Self::schedule_expiry(&runtime, state_ref, id, expiry_ms);
            state.timers.insert(id, timer);
        }
        state.publish();

        debug!(%id, ?kind, expiry_ms, "Notification enqueued");
        Ok(id)
    }

    fn schedule_expiry(
        runtime: &Handle,
        state: Weak<Mutex<QueueState>>,
        id: NotificationId,
        expiry_ms: i64,
    ) -> AbortHandle {
        let delay = Duration::from_millis(expiry_ms.unsigned_abs());
        runtime
            .spawn(async move {
                tokio::time::sleep(delay).await;
                let Some(state) = state.upgrade() else {
                    return;
                };
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                state.timers.remove(&id);
                if state.remove_item(id) {
                    state.publish();
                    debug!(%id, "Notification expired");
                }
            })
            .abort_handle()
    }

    /// Enqueue with the default kind and expiry
    pub fn push(&self, message: impl Into<String>) -> Result<NotificationId, NotificationError> {
        self.enqueue(message, NotificationKind::Info, self.default_expiry_ms)
    }

    pub fn success(&self, message: impl Into<String>) -> Result<NotificationId, NotificationError> {
        self.enqueue(message, NotificationKind::Success, self.default_expiry_ms)
    }

    pub fn error(&self, message: impl Into<String>) -> Result<NotificationId, NotificationError> {
        self.enqueue(message, NotificationKind::Error, self.default_expiry_ms)
    }

    pub fn info(&self, message: impl Into<String>) -> Result<NotificationId, NotificationError> {
        self.enqueue(message, NotificationKind::Info, self.default_expiry_ms)
    }

    pub fn warning(&self, message: impl Into<String>) -> Result<NotificationId, NotificationError> {
        self.enqueue(message, NotificationKind::Warning, self.default_expiry_ms)
    }

    /// Remove a notification and cancel its timer.
    ///
    /// Unknown or already removed ids are a no-op. Returns whether anything
    /// was removed.
    pub fn remove(&self, id: NotificationId) -> bool {
        let mut state = self.lock();
        if let Some(timer) = state.timers.remove(&id) {
            timer.abort();
        }
        let removed = state.remove_item(id);
        if removed {
            state.publish();
            debug!(%id, "Notification removed");
        }
        removed
    }

    /// Remove every notification and cancel every pending timer.
    /// Returns how many notifications were dropped.
    pub fn clear_all(&self) -> usize {
        let mut state = self.lock();
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
        let cleared = state.items.len();
        state.items.clear();
        state.publish();
        debug!(cleared, "Notifications cleared");
        cleared
    }

    pub fn count(&self) -> usize {
        self.lock().items.len()
    }

    pub fn has_any(&self) -> bool {
        self.count() > 0
    }

    /// Current notifications in display order
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().items.clone()
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.lock().items.iter().find(|n| n.id == id).cloned()
    }

    /// Most recently enqueued notification still present
    pub fn latest(&self) -> Option<Notification> {
        self.lock().items.last().cloned()
    }

    /// Number of expiry timers still armed
    pub fn pending_timers(&self) -> usize {
        self.lock().timers.len()
    }

    /// Receive the full list every time it changes
    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.lock().snapshots.subscribe()
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NotificationQueue {
    fn drop(&mut self) {
        let mut state = self.lock();
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn messages(queue: &NotificationQueue) -> Vec<String> {
        queue.notifications().into_iter().map(|n| n.message).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_preserves_insertion_order() {
        let queue = NotificationQueue::new();
        for message in ["first", "second", "third"] {
            queue.push(message).unwrap();
            assert_eq!(messages(&queue).last().map(String::as_str), Some(message));
        }
        assert_eq!(messages(&queue), vec!["first", "second", "third"]);
        assert_eq!(queue.count(), 3);
        assert!(queue.has_any());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_expiry_never_auto_removes() {
        let queue = NotificationQueue::new();
        let id = queue.enqueue("Saved", NotificationKind::Success, 0).unwrap();
        assert_eq!(queue.pending_timers(), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(queue.count(), 1);
        assert!(queue.get(id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_expiry_never_auto_removes() {
        let queue = NotificationQueue::new();
        queue.enqueue("Pinned", NotificationKind::Warning, -1).unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(queue.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_expires_after_its_lifetime() {
        let queue = NotificationQueue::new();
        queue.enqueue("Will fade", NotificationKind::Info, 100).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(queue.count(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(queue.count(), 0);
        assert!(!queue.has_any());
        assert_eq!(queue.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_keeps_survivor_order() {
        let queue = NotificationQueue::new();
        queue.enqueue("a", NotificationKind::Info, 0).unwrap();
        queue.enqueue("b", NotificationKind::Info, 100).unwrap();
        queue.enqueue("c", NotificationKind::Info, 0).unwrap();
        queue.enqueue("d", NotificationKind::Info, 300).unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(messages(&queue), vec!["a", "c", "d"]);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(messages(&queue), vec!["a", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_cancels_timer_and_is_idempotent() {
        let queue = NotificationQueue::new();
        let keep = queue.enqueue("keep", NotificationKind::Info, 0).unwrap();
        let id = queue.enqueue("drop", NotificationKind::Info, 100).unwrap();
        assert_eq!(queue.pending_timers(), 1);

        assert!(queue.remove(id));
        assert_eq!(queue.count(), 1);
        assert_eq!(queue.pending_timers(), 0);

        assert!(!queue.remove(id));
        assert_eq!(queue.count(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(queue.count(), 1);
        assert!(queue.get(keep).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_middle_keeps_order() {
        let queue = NotificationQueue::new();
        queue.push("a").unwrap();
        let b = queue.push("b").unwrap();
        queue.push("c").unwrap();

        queue.remove(b);
        assert_eq!(messages(&queue), vec!["a", "c"]);
    }

    #[test]
    fn test_remove_unknown_id_on_empty_queue() {
        let queue = NotificationQueue::new();
        assert!(!queue.remove(NotificationId::new()));
        assert_eq!(queue.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all_cancels_every_timer() {
        let queue = NotificationQueue::new();
        for i in 0..5 {
            queue.enqueue(format!("n{}", i), NotificationKind::Info, 100).unwrap();
        }
        queue.enqueue("sticky", NotificationKind::Info, 0).unwrap();

        assert_eq!(queue.clear_all(), 6);
        assert_eq!(queue.count(), 0);
        assert_eq!(queue.pending_timers(), 0);

        // A notification added after the clear is untouched by the old timers
        queue.enqueue("after", NotificationKind::Info, 0).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(messages(&queue), vec!["after"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all_then_time_passes_stays_empty() {
        let queue = NotificationQueue::new();
        queue.enqueue("x", NotificationKind::Error, 50).unwrap();
        queue.clear_all();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(queue.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_messages_get_distinct_ids() {
        let queue = NotificationQueue::new();
        let a = queue.push("Same").unwrap();
        let b = queue.push("Same").unwrap();
        assert_ne!(a, b);
        assert_eq!(queue.count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enqueues_never_collide() {
        let queue = Arc::new(NotificationQueue::new());
        let mut tasks = Vec::new();
        for _ in 0..50 {
            let queue = queue.clone();
            tasks.push(tokio::spawn(async move {
                queue.enqueue("Same", NotificationKind::Info, 0).unwrap()
            }));
        }

        let mut ids = HashSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap());
        }
        assert_eq!(ids.len(), 50);
        assert_eq!(queue.count(), 50);
    }

    #[test]
    fn test_empty_message_rejected() {
        let queue = NotificationQueue::new();
        assert_eq!(
            queue.enqueue("", NotificationKind::Info, 0),
            Err(NotificationError::EmptyMessage)
        );
        assert_eq!(
            queue.enqueue("  \n", NotificationKind::Info, 0),
            Err(NotificationError::EmptyMessage)
        );
        assert_eq!(queue.count(), 0);
    }

    #[test]
    fn test_expiring_enqueue_without_runtime() {
        let queue = NotificationQueue::new();
        assert_eq!(
            queue.enqueue("Later", NotificationKind::Info, 100),
            Err(NotificationError::NoRuntime)
        );
        assert_eq!(queue.count(), 0);

        // Non-expiring notifications need no timer, so no runtime either
        assert!(queue.enqueue("Now", NotificationKind::Info, 0).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_convenience_methods_use_default_expiry() {
        let queue = NotificationQueue::with_default_expiry(200);
        let id = queue.warning("Low stock").unwrap();
        let n = queue.get(id).unwrap();
        assert_eq!(n.kind, NotificationKind::Warning);
        assert_eq!(n.expiry_ms, 200);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(queue.get(id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_expiry() {
        let queue = NotificationQueue::new();
        let mut rx = queue.subscribe();

        queue.enqueue("Will fade", NotificationKind::Info, 100).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }

    fn alive_tasks() -> usize {
        Handle::current().metrics().num_alive_tasks()
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_outstanding_timers() {
        let queue = NotificationQueue::new();
        queue.enqueue("first", NotificationKind::Info, 100).unwrap();
        queue.enqueue("second", NotificationKind::Info, 60_000).unwrap();
        assert_eq!(alive_tasks(), 2);

        drop(queue);
        // Aborted tasks are reaped the next time the scheduler runs
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(alive_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_and_clear_abort_timer_tasks() {
        let queue = NotificationQueue::new();
        let id = queue.enqueue("a", NotificationKind::Info, 60_000).unwrap();
        queue.enqueue("b", NotificationKind::Info, 60_000).unwrap();
        queue.enqueue("c", NotificationKind::Info, 60_000).unwrap();
        assert_eq!(alive_tasks(), 3);

        queue.remove(id);
        tokio::task::yield_now().await;
        assert_eq!(alive_tasks(), 2);

        queue.clear_all();
        tokio::task::yield_now().await;
        assert_eq!(alive_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_queue_closes_subscribers() {
        let queue = NotificationQueue::new();
        queue.enqueue("orphan", NotificationKind::Info, 100).unwrap();
        let mut rx = queue.subscribe();

        drop(queue);
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_returns_newest() {
        let queue = NotificationQueue::new();
        assert!(queue.latest().is_none());
        queue.push("old").unwrap();
        queue.push("new").unwrap();
        assert_eq!(queue.latest().unwrap().message, "new");
    }
}
