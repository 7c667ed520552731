use std::collections::VecDeque;

use tokio::time::Instant;

use crate::types::{Frame, Result, SessionError};

/// A frame buffered while the session was disconnected
#[derive(Debug)]
pub struct QueuedFrame {
    pub frame: Frame,
    pub queued_at: Instant,
}

/// Bounded FIFO buffer for frames sent while disconnected.
///
/// Overflow policy is reject-new: a frame that arrives at capacity is refused
/// with [`SessionError::QueueFull`] and already-queued frames are never
/// displaced. Flushing drains from the front; a flush interrupted by a dead
/// connection puts the in-flight frame back at the front so order is
/// preserved for the next attempt.
pub struct OutboundQueue {
    frames: VecDeque<QueuedFrame>,
    capacity: usize,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            capacity,
        }
    }

    pub fn enqueue(&mut self, frame: Frame) -> Result<()> {
        if self.frames.len() >= self.capacity {
            return Err(SessionError::QueueFull);
        }
        self.frames.push_back(QueuedFrame {
            frame,
            queued_at: Instant::now(),
        });
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<QueuedFrame> {
        self.frames.pop_front()
    }

    /// Puts a frame back at the head after an interrupted flush
    pub fn requeue_front(&mut self, entry: QueuedFrame) {
        self.frames.push_front(entry);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
