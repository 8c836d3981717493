//! One-way render → control thread channel for settled props.
//!
//! The render thread crosses to the control thread exactly once per settling
//! event. Dispatch is fire-and-forget: no acknowledgement, no backpressure.
//! Messages from one dispatching thread arrive in send order.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use glide_core::{StyleProps, Tag};

use crate::error::{GlideError, Result};
use crate::registry::{ComponentRegistry, update_props_on_control_thread};

/// Final prop snapshot for a tag whose animation has settled.
#[derive(Debug, Clone, PartialEq)]
pub struct SettledProps {
    pub tag: Tag,
    pub props: StyleProps,
}

/// Render-thread side of the channel.
#[derive(Debug, Clone)]
pub struct ControlDispatcher {
    sender: Sender<SettledProps>,
}

/// Control-thread side of the channel.
#[derive(Debug)]
pub struct ControlQueue {
    receiver: Receiver<SettledProps>,
}

static_assertions::assert_impl_all!(SettledProps: Send);
static_assertions::assert_impl_all!(ControlDispatcher: Send, Clone);
static_assertions::assert_impl_all!(ControlQueue: Send);

/// Create a connected dispatcher / queue pair.
pub fn control_channel() -> (ControlDispatcher, ControlQueue) {
    let (sender, receiver) = mpsc::channel();
    (ControlDispatcher { sender }, ControlQueue { receiver })
}

impl ControlDispatcher {
    /// Send settled props, reporting a closed control thread.
    pub fn try_dispatch(&self, tag: Tag, props: StyleProps) -> Result<()> {
        self.sender
            .send(SettledProps { tag, props })
            .map_err(|_| GlideError::ControlThreadClosed(tag))
    }

    /// Send settled props; a closed control thread is logged, not reported.
    pub fn dispatch(&self, tag: Tag, props: StyleProps) {
        if let Err(err) = self.try_dispatch(tag, props) {
            log::warn!("{err}");
        }
    }
}

impl ControlQueue {
    /// Take the next message without blocking.
    pub fn try_next(&self) -> Option<SettledProps> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Apply every queued snapshot to the registry. Returns how many were delivered
    /// to a live component.
    pub fn drain(&self, registry: &ComponentRegistry) -> usize {
        let mut delivered = 0;
        while let Some(SettledProps { tag, props }) = self.try_next() {
            if update_props_on_control_thread(registry, tag, &props) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Block, applying snapshots as they arrive, until every dispatcher is dropped.
    pub fn run(&self, registry: &ComponentRegistry) -> usize {
        let mut delivered = 0;
        while let Ok(SettledProps { tag, props }) = self.receiver.recv() {
            if update_props_on_control_thread(registry, tag, &props) {
                delivered += 1;
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AnimatedComponent;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        received: RefCell<Vec<StyleProps>>,
    }

    impl AnimatedComponent for Recorder {
        fn update_animated_props(&self, props: &StyleProps) {
            self.received.borrow_mut().push(props.clone());
        }
    }

    #[test]
    fn test_messages_preserve_order() {
        let (dispatcher, queue) = control_channel();
        dispatcher.dispatch(Tag(1), StyleProps::new().with("a", 1.0));
        dispatcher.dispatch(Tag(2), StyleProps::new().with("b", 2.0));

        assert_eq!(queue.try_next().map(|m| m.tag), Some(Tag(1)));
        assert_eq!(queue.try_next().map(|m| m.tag), Some(Tag(2)));
        assert!(queue.try_next().is_none());
    }

    #[test]
    fn test_drain_skips_stale_tags() {
        let (dispatcher, queue) = control_channel();
        let mut registry = ComponentRegistry::new();
        let live = Rc::new(Recorder::default());
        registry.register(Tag(1), live.clone());

        dispatcher.dispatch(Tag(1), StyleProps::new().with("opacity", 1.0));
        dispatcher.dispatch(Tag(9), StyleProps::new().with("opacity", 0.0));

        assert_eq!(queue.drain(&registry), 1);
        assert_eq!(live.received.borrow().len(), 1);
    }

    #[test]
    fn test_closed_control_thread() {
        let (dispatcher, queue) = control_channel();
        drop(queue);

        let err = dispatcher.try_dispatch(Tag(4), StyleProps::new()).unwrap_err();
        assert!(matches!(err, GlideError::ControlThreadClosed(Tag(4))));
        // Fire-and-forget path does not panic
        dispatcher.dispatch(Tag(4), StyleProps::new());
    }

    #[test]
    fn test_run_across_threads() {
        let (dispatcher, queue) = control_channel();
        let sender = std::thread::spawn(move || {
            for i in 0..3 {
                dispatcher.dispatch(Tag(1), StyleProps::new().with("step", f64::from(i)));
            }
        });

        let mut registry = ComponentRegistry::new();
        let component = Rc::new(Recorder::default());
        registry.register(Tag(1), component.clone());

        sender.join().unwrap();
        assert_eq!(queue.run(&registry), 3);
        let steps: Vec<_> = component
            .received
            .borrow()
            .iter()
            .filter_map(|p| p.get_f64("step"))
            .collect();
        assert_eq!(steps, vec![0.0, 1.0, 2.0]);
    }
}
