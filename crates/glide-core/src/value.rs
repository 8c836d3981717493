//! Observable values driven on the render thread.
//!
//! A `MutableValue<T>` is a shared, single-threaded cell. Writes through
//! [`MutableValue::set`] notify every subscriber synchronously. Subscribers
//! are identified by globally unique [`SubscriptionId`] handles, so unrelated
//! observers of the same value can never overwrite each other.
//!
//! A value can also be driven by an [`Animation`]: each display refresh steps
//! the animation, writes the new frame, and notifies subscribers. Attaching a
//! new animation interrupts the running one, whose callback receives `false`.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::animation::Animation;
use crate::scheduler::FrameScheduler;

/// Handle identifying one subscriber of a [`MutableValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl SubscriptionId {
    /// Generate a new unique handle.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

type Listener<T> = Rc<dyn Fn(&T)>;

struct RunningAnimation<T> {
    generation: u64,
    animation: Box<dyn Animation<T>>,
}

struct ValueCell<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<(SubscriptionId, Listener<T>)>>,
    /// Listener snapshot reused across notifications.
    scratch: RefCell<Vec<Listener<T>>>,
    animation: RefCell<Option<RunningAnimation<T>>>,
    generation: Cell<u64>,
}

/// Shared observable value owned by the render thread.
///
/// Cloning yields another handle to the same value. Listeners receive the
/// value by reference while it is borrowed; they may read it, subscribe, or
/// unsubscribe, but must not write the value they observe.
pub struct MutableValue<T> {
    cell: Rc<ValueCell<T>>,
}

impl<T> Clone for MutableValue<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: 'static> MutableValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            cell: Rc::new(ValueCell {
                value: RefCell::new(value),
                listeners: RefCell::new(Vec::new()),
                scratch: RefCell::new(Vec::new()),
                animation: RefCell::new(None),
                generation: Cell::new(0),
            }),
        }
    }

    /// Borrow the current value.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.cell.value.borrow()
    }

    /// Run `f` against the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.value.borrow())
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        *self.cell.value.borrow_mut() = value;
        self.notify();
    }

    /// Replace the value without notifying subscribers.
    pub fn set_silently(&self, value: T) {
        *self.cell.value.borrow_mut() = value;
    }

    /// Modify the value in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.cell.value.borrow_mut());
        self.notify();
    }

    /// Modify the value in place without notifying subscribers.
    pub fn update_silently(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.cell.value.borrow_mut());
    }

    /// Register a listener fired on every notifying write.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.cell.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if the handle was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.cell.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.cell.listeners.borrow().len()
    }

    /// True when both handles point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    fn notify(&self) {
        // Listeners may (un)subscribe while running, so call a snapshot
        let mut batch = self.cell.scratch.take();
        batch.extend(
            self.cell
                .listeners
                .borrow()
                .iter()
                .map(|(_, listener)| Rc::clone(listener)),
        );
        if !batch.is_empty() {
            let value = self.cell.value.borrow();
            for listener in &batch {
                listener(&value);
            }
        }
        batch.clear();
        *self.cell.scratch.borrow_mut() = batch;
    }

    /// Drive this value with `animation`, starting from the current value.
    ///
    /// A running animation is interrupted first and its callback receives
    /// `false`. Frames are produced on each display refresh of `scheduler`.
    pub fn animate(&self, scheduler: &FrameScheduler, animation: impl Animation<T>) {
        self.stop_animation();

        let mut animation: Box<dyn Animation<T>> = Box::new(animation);
        animation.start(&self.cell.value.borrow());

        let generation = self.cell.generation.get() + 1;
        self.cell.generation.set(generation);
        *self.cell.animation.borrow_mut() = Some(RunningAnimation {
            generation,
            animation,
        });
        self.schedule_step(scheduler, generation);
    }

    /// Interrupt the running animation, if any. Its callback receives `false`.
    pub fn stop_animation(&self) -> bool {
        let interrupted = self.cell.animation.borrow_mut().take();
        match interrupted {
            Some(mut running) => {
                if let Some(callback) = running.animation.take_callback() {
                    callback(false);
                }
                true
            }
            None => false,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.cell.animation.borrow().is_some()
    }

    fn is_current(&self, generation: u64) -> bool {
        matches!(&*self.cell.animation.borrow(), Some(running) if running.generation == generation)
    }

    fn schedule_step(&self, scheduler: &FrameScheduler, generation: u64) {
        let value = self.clone();
        let sched = scheduler.clone();
        scheduler.request_frame(move |timestamp| value.step(&sched, generation, timestamp));
    }

    fn step(&self, scheduler: &FrameScheduler, generation: u64, timestamp: f64) {
        let finished = {
            let mut slot = self.cell.animation.borrow_mut();
            match slot.as_mut() {
                Some(running) if running.generation == generation => running
                    .animation
                    .step(timestamp, &mut self.cell.value.borrow_mut()),
                // Replaced or stopped since this frame was requested
                _ => return,
            }
        };

        self.notify();

        if !self.is_current(generation) {
            return;
        }
        if finished {
            let done = self.cell.animation.borrow_mut().take();
            if let Some(callback) = done.and_then(|mut running| running.animation.take_callback()) {
                callback(true);
            }
        } else {
            self.schedule_step(scheduler, generation);
        }
    }
}

impl<T: Clone + 'static> MutableValue<T> {
    /// Clone out the current value.
    pub fn get(&self) -> T {
        self.cell.value.borrow().clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for MutableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableValue")
            .field("value", &*self.cell.value.borrow())
            .field("listeners", &self.cell.listeners.borrow().len())
            .field("animating", &self.cell.animation.borrow().is_some())
            .finish()
    }
}
