//! Render-thread scheduling primitives.
//!
//! `FrameScheduler` models the two deferral granularities the commit pipeline
//! relies on:
//! - **microtasks**: run after the current synchronous turn, before the next frame
//! - **frame callbacks**: run once on the next display refresh
//!
//! It also owns the frame clock: the timestamp of the frame currently being
//! (or last) processed. Frame callbacks cannot be cancelled; callers that need
//! to avoid duplicates keep their own pending flags.
//!
//! The scheduler is single-threaded (`!Send`); it lives on the render thread
//! and is driven by whatever produces display refresh ticks.
//!
//! # Usage
//!
//! ```
//! use glide_core::FrameScheduler;
//!
//! let scheduler = FrameScheduler::new();
//! scheduler.request_frame(|timestamp| println!("frame at {timestamp}"));
//! scheduler.queue_microtask(|| println!("after this turn"));
//!
//! scheduler.drain_microtasks();
//! scheduler.run_frame(16.0);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Microtask = Box<dyn FnOnce()>;
type FrameCallback = Box<dyn FnOnce(f64)>;

/// Handle returned by [`FrameScheduler::request_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequestId(pub u64);

#[derive(Default)]
struct SchedulerState {
    microtasks: VecDeque<Microtask>,
    frame_callbacks: Vec<(FrameRequestId, FrameCallback)>,
    /// Emptied buffer from the previous frame, reused to avoid per-frame allocation.
    spare: Vec<(FrameRequestId, FrameCallback)>,
    frame_timestamp: Option<f64>,
    next_request_id: u64,
    frames_run: u64,
}

/// Microtask queue, display-refresh queue, and frame clock for one render thread.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task to run after the current synchronous turn.
    pub fn queue_microtask(&self, task: impl FnOnce() + 'static) {
        self.state.borrow_mut().microtasks.push_back(Box::new(task));
    }

    /// Queue a callback for the next display refresh.
    pub fn request_frame(&self, callback: impl FnOnce(f64) + 'static) -> FrameRequestId {
        let mut state = self.state.borrow_mut();
        state.next_request_id += 1;
        let id = FrameRequestId(state.next_request_id);
        state.frame_callbacks.push((id, Box::new(callback)));
        id
    }

    /// Timestamp of the current (or most recent) frame, `None` before the first frame.
    pub fn frame_timestamp(&self) -> Option<f64> {
        self.state.borrow().frame_timestamp
    }

    /// Number of frames processed so far.
    pub fn frames_run(&self) -> u64 {
        self.state.borrow().frames_run
    }

    pub fn pending_microtasks(&self) -> usize {
        self.state.borrow().microtasks.len()
    }

    pub fn pending_frame_callbacks(&self) -> usize {
        self.state.borrow().frame_callbacks.len()
    }

    /// Run queued microtasks until the queue is empty, including microtasks
    /// queued by the ones being run. Returns how many ran.
    pub fn drain_microtasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.state.borrow_mut().microtasks.pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Process one display refresh at `timestamp`.
    ///
    /// Pending microtasks run first. Then every callback requested before this
    /// call runs in request order, with microtasks drained after each one.
    /// Callbacks requested while the frame runs wait for the next frame.
    /// The frame clock never goes backwards. Returns how many callbacks ran.
    pub fn run_frame(&self, timestamp: f64) -> usize {
        self.drain_microtasks();

        let (timestamp, mut batch) = {
            let mut state = self.state.borrow_mut();
            let timestamp = match state.frame_timestamp {
                Some(prev) if prev > timestamp => prev,
                _ => timestamp,
            };
            state.frame_timestamp = Some(timestamp);
            state.frames_run += 1;
            let spare = std::mem::take(&mut state.spare);
            (timestamp, std::mem::replace(&mut state.frame_callbacks, spare))
        };

        let count = batch.len();
        for (_, callback) in batch.drain(..) {
            callback(timestamp);
            self.drain_microtasks();
        }

        let mut state = self.state.borrow_mut();
        if state.spare.capacity() < batch.capacity() {
            state.spare = batch;
        }
        log::trace!("frame {timestamp:.2}ms ran {count} callbacks");
        count
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FrameScheduler")
            .field("frame_timestamp", &state.frame_timestamp)
            .field("pending_microtasks", &state.microtasks.len())
            .field("pending_frame_callbacks", &state.frame_callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_microtasks_run_in_order_including_nested() {
        let scheduler = FrameScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let (s, l) = (scheduler.clone(), log.clone());
        scheduler.queue_microtask(move || {
            l.borrow_mut().push(1);
            let l2 = l.clone();
            s.queue_microtask(move || l2.borrow_mut().push(3));
        });
        let l = log.clone();
        scheduler.queue_microtask(move || l.borrow_mut().push(2));

        assert_eq!(scheduler.drain_microtasks(), 3);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_frame_callbacks_requested_during_frame_wait() {
        let scheduler = FrameScheduler::new();
        let hits = Rc::new(Cell::new(0));

        let (s, h) = (scheduler.clone(), hits.clone());
        scheduler.request_frame(move |_| {
            h.set(h.get() + 1);
            let h2 = h.clone();
            s.request_frame(move |_| h2.set(h2.get() + 10));
        });

        assert_eq!(scheduler.run_frame(16.0), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(scheduler.pending_frame_callbacks(), 1);

        assert_eq!(scheduler.run_frame(32.0), 1);
        assert_eq!(hits.get(), 11);
        assert_eq!(scheduler.run_frame(48.0), 0);
    }

    #[test]
    fn test_microtasks_drain_between_frame_callbacks() {
        let scheduler = FrameScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let (s, l) = (scheduler.clone(), log.clone());
        scheduler.request_frame(move |_| {
            l.borrow_mut().push("frame-a");
            let l2 = l.clone();
            s.queue_microtask(move || l2.borrow_mut().push("micro-a"));
        });
        let l = log.clone();
        scheduler.request_frame(move |_| l.borrow_mut().push("frame-b"));

        scheduler.run_frame(16.0);
        assert_eq!(*log.borrow(), vec!["frame-a", "micro-a", "frame-b"]);
    }

    #[test]
    fn test_frame_clock_is_monotonic() {
        let scheduler = FrameScheduler::new();
        assert_eq!(scheduler.frame_timestamp(), None);

        let seen = Rc::new(Cell::new(0.0));
        scheduler.run_frame(100.0);
        let s = seen.clone();
        scheduler.request_frame(move |ts| s.set(ts));
        scheduler.run_frame(50.0);

        assert_eq!(seen.get(), 100.0);
        assert_eq!(scheduler.frame_timestamp(), Some(100.0));
        assert_eq!(scheduler.frames_run(), 2);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let scheduler = FrameScheduler::new();
        let a = scheduler.request_frame(|_| {});
        let b = scheduler.request_frame(|_| {});
        assert_ne!(a, b);
    }
}
