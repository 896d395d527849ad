use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

/// One tick of the animation loop.
#[derive(Clone, Copy, Debug)]
pub struct FrameTick {
    /// Time since the loop started. Monotonic.
    pub elapsed: Duration,
    pub delta: Duration,
    pub frame: u64,
}

/// Self-perpetuating per-frame task. The owner asks for the next tick on every
/// redraw and only re-requests a redraw while a tick was handed out.
pub struct FrameLoop {
    started: Instant,
    last: Instant,
    frame: u64,
    cancelled: Rc<Cell<bool>>,
}

/// Teardown side of a [`FrameLoop`]. Cancelling (or dropping) it stops the loop.
pub struct FrameHandle {
    cancelled: Rc<Cell<bool>>,
}

impl FrameLoop {
    pub fn start() -> (FrameLoop, FrameHandle) {
        let now = Instant::now();
        let cancelled = Rc::new(Cell::new(false));
        let frame_loop = FrameLoop {
            started: now,
            last: now,
            frame: 0,
            cancelled: Rc::clone(&cancelled),
        };
        (frame_loop, FrameHandle { cancelled })
    }

    pub fn is_running(&self) -> bool {
        !self.cancelled.get()
    }

    pub fn next_frame(&mut self) -> Option<FrameTick> {
        if !self.is_running() {
            return None;
        }
        let now = Instant::now();
        let tick = FrameTick {
            elapsed: now.duration_since(self.started),
            delta: now.duration_since(self.last),
            frame: self.frame,
        };
        self.last = now;
        self.frame += 1;
        Some(tick)
    }
}

impl FrameHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct Scheduled<T> {
    // scheduling order, breaks ties between equal deadlines
    seq: u64,
    due: Duration,
    payload: T,
}

/// Delayed one-shot tasks measured on the owner's clock. Nothing runs by
/// itself: the owner drains due payloads with [`DelayedTasks::take_due`].
pub struct DelayedTasks<T> {
    pending: Vec<Scheduled<T>>,
    next_seq: u64,
}

impl<T> Default for DelayedTasks<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<T> DelayedTasks<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Scheduled { seq, due, payload });
    }

    /// Drops every pending task. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Removes and returns every payload due at `now`, earliest first.
    pub fn take_due(&mut self, now: Duration) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|task| task.due <= now);
        self.pending = pending;
        due.sort_by_key(|task| (task.due, task.seq));
        due.into_iter().map(|task| task.payload).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
