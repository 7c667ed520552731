use tokio::task::JoinHandle;

/// Owns every background task handle for one session (read loop, heartbeat,
/// expiry timer, reconnect loop, typing timers) so that teardown cannot miss
/// one.
pub struct TaskManager {
    handles: Vec<JoinHandle<()>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Spawn a task and track it. Finished handles are pruned on the way in
    /// so long-lived sessions with many reconnects don't accumulate them.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.handles.retain(|handle| !handle.is_finished());
        self.handles.push(tokio::spawn(future));
    }

    /// Abort all tracked tasks without waiting
    pub fn abort_all(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
        self.handles.clear();
    }

    /// Abort all tracked tasks and wait for them to finish
    pub async fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
            // Aborted tasks resolve with a cancellation error; ignore it
            let _ = handle.await;
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
