//! Layout transition animations, one per tag.
//!
//! The manager keeps, per tag, the animation spec currently running and the
//! mutable value it drives. Every frame written to that value is reported to
//! a [`ProgressObserver`]. A second `start` for a tag that is still animating
//! merges into the running state instead of replacing it, so properties the
//! new request does not mention keep moving toward their old targets.
//!
//! State for a tag is torn down only when its animation finishes. An exit
//! transition asks the observer to remove the view at that point, never
//! earlier.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use glide_core::{
    AnimationCallback, AnimationSpec, FrameScheduler, MutableValue, StyleAnimation, StyleProps,
    SubscriptionId, Tag,
};

/// Kind of layout transition being started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutAnimationType {
    Entering,
    Exiting,
    Layout,
    SharedElementTransition,
    /// Progress-driven shared transition; handled entirely by the coordinator.
    SharedElementTransitionProgress,
}

impl LayoutAnimationType {
    /// Whether finishing this transition removes the underlying view.
    pub fn removes_view(self) -> bool {
        self == Self::Exiting
    }

    pub fn is_shared_transition(self) -> bool {
        self == Self::SharedElementTransition
    }
}

/// What a layout animation config function produces from measured values.
pub struct LayoutAnimationConfig {
    pub initial_values: StyleProps,
    pub animations: AnimationSpec,
    pub callback: Option<AnimationCallback>,
}

impl LayoutAnimationConfig {
    pub fn new(initial_values: StyleProps, animations: AnimationSpec) -> Self {
        Self {
            initial_values,
            animations,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: impl FnOnce(bool) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for LayoutAnimationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutAnimationConfig")
            .field("initial_values", &self.initial_values)
            .field("animations", &self.animations)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Native side receiving layout animation progress.
pub trait ProgressObserver {
    fn notify_progress(&self, tag: Tag, value: &StyleProps, is_shared_transition: bool);
    fn notify_end(&self, tag: Tag, remove_view: bool);
}

/// Coordinator for progress-driven shared element transitions.
pub trait SharedTransitionCoordinator {
    fn on_transition_start(&self, tag: Tag, measured: &StyleProps);
}

/// Coordinator that ignores every transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCoordinator;

impl SharedTransitionCoordinator for NoopCoordinator {
    fn on_transition_start(&self, tag: Tag, _measured: &StyleProps) {
        log::debug!("no shared transition coordinator for {tag}");
    }
}

/// When `start` does its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartTiming {
    /// Synchronously inside `start`.
    #[default]
    Immediate,
    /// On the next display refresh, once layout measurement is valid.
    NextFrame,
}

impl StartTiming {
    pub fn from_config(config: &glide_config::LayoutConfig) -> Self {
        if config.defer_start_to_next_frame {
            Self::NextFrame
        } else {
            Self::Immediate
        }
    }
}

#[derive(Default)]
struct LayoutState {
    current_animation_for_tag: HashMap<Tag, AnimationSpec>,
    mutable_values_for_tag: HashMap<Tag, MutableValue<StyleProps>>,
    progress_subscriptions: HashMap<Tag, SubscriptionId>,
}

struct LayoutInner {
    scheduler: FrameScheduler,
    observer: Rc<dyn ProgressObserver>,
    coordinator: Rc<dyn SharedTransitionCoordinator>,
    timing: StartTiming,
    state: RefCell<LayoutState>,
}

/// Runs layout transitions on the render thread.
#[derive(Clone)]
pub struct LayoutAnimationsManager {
    inner: Rc<LayoutInner>,
}

impl LayoutAnimationsManager {
    pub fn new(
        scheduler: FrameScheduler,
        observer: Rc<dyn ProgressObserver>,
        coordinator: Rc<dyn SharedTransitionCoordinator>,
        timing: StartTiming,
    ) -> Self {
        Self {
            inner: Rc::new(LayoutInner {
                scheduler,
                observer,
                coordinator,
                timing,
                state: RefCell::new(LayoutState::default()),
            }),
        }
    }

    /// Start (or merge into) the layout animation for `tag`.
    ///
    /// `config` turns the measured layout values into initial values,
    /// per-property animations, and an optional completion callback.
    pub fn start(
        &self,
        tag: Tag,
        kind: LayoutAnimationType,
        measured: StyleProps,
        config: impl FnOnce(&StyleProps) -> LayoutAnimationConfig + 'static,
    ) {
        match self.inner.timing {
            StartTiming::Immediate => self.start_now(tag, kind, &measured, config),
            StartTiming::NextFrame => {
                let this = self.clone();
                self.inner
                    .scheduler
                    .request_frame(move |_| this.start_now(tag, kind, &measured, config));
            }
        }
    }

    fn start_now(
        &self,
        tag: Tag,
        kind: LayoutAnimationType,
        measured: &StyleProps,
        config: impl FnOnce(&StyleProps) -> LayoutAnimationConfig,
    ) {
        if kind == LayoutAnimationType::SharedElementTransitionProgress {
            self.inner.coordinator.on_transition_start(tag, measured);
            return;
        }

        let LayoutAnimationConfig {
            initial_values,
            animations,
            callback,
        } = config(measured);

        let (spec, existing) = {
            let mut state = self.inner.state.borrow_mut();
            let spec = match state.current_animation_for_tag.get(&tag) {
                Some(previous) => previous.merged(&animations),
                None => animations,
            };
            state.current_animation_for_tag.insert(tag, spec.clone());
            (spec, state.mutable_values_for_tag.get(&tag).cloned())
        };

        let value = match existing {
            Some(value) => {
                log::debug!("merging layout animation {kind:?} into running one for {tag}");
                self.stop_observing(tag, false);
                value.update_silently(|live| live.merge(&initial_values));
                value
            }
            None => {
                log::debug!("starting layout animation {kind:?} for {tag}");
                let value = MutableValue::new(initial_values);
                self.inner
                    .state
                    .borrow_mut()
                    .mutable_values_for_tag
                    .insert(tag, value.clone());
                value
            }
        };

        let this = self.clone();
        let animation = StyleAnimation::new(spec).with_callback(move |finished| {
            if finished {
                log::debug!("layout animation {kind:?} for {tag} finished");
                this.stop_observing(tag, kind.removes_view());
                this.remove_state(tag);
            }
            if let Some(callback) = callback {
                callback(finished);
            }
        });

        self.start_observing(tag, &value, kind);
        value.animate(&self.inner.scheduler, animation);
    }

    /// Stop reporting progress for `tag` without removing the view.
    ///
    /// No-op when `tag` has no layout animation state.
    pub fn stop(&self, tag: Tag) {
        if self.value(tag).is_none() {
            return;
        }
        self.stop_observing(tag, false);
    }

    /// Drop all state for a view that no longer exists.
    ///
    /// The running animation is interrupted (its callback receives `false`)
    /// and the observer hears nothing further about `tag`. Returns `false`
    /// when there was no state.
    pub fn forget(&self, tag: Tag) -> bool {
        let (id, value) = {
            let mut state = self.inner.state.borrow_mut();
            state.current_animation_for_tag.remove(&tag);
            (
                state.progress_subscriptions.remove(&tag),
                state.mutable_values_for_tag.remove(&tag),
            )
        };
        let Some(value) = value else {
            return false;
        };
        if let Some(id) = id {
            value.unsubscribe(id);
        }
        value.stop_animation();
        log::debug!("dropped layout animation state for {tag}");
        true
    }

    pub fn has_state(&self, tag: Tag) -> bool {
        let state = self.inner.state.borrow();
        state.current_animation_for_tag.contains_key(&tag)
            || state.mutable_values_for_tag.contains_key(&tag)
    }

    /// Tags with layout animation state, in ascending order.
    pub fn active_tags(&self) -> Vec<Tag> {
        let mut tags: Vec<_> = self
            .inner
            .state
            .borrow()
            .mutable_values_for_tag
            .keys()
            .copied()
            .collect();
        tags.sort();
        tags
    }

    pub fn current_animation(&self, tag: Tag) -> Option<AnimationSpec> {
        self.inner
            .state
            .borrow()
            .current_animation_for_tag
            .get(&tag)
            .cloned()
    }

    /// The live value driving `tag`'s transition.
    pub fn value(&self, tag: Tag) -> Option<MutableValue<StyleProps>> {
        self.inner
            .state
            .borrow()
            .mutable_values_for_tag
            .get(&tag)
            .cloned()
    }

    fn remove_state(&self, tag: Tag) {
        let mut state = self.inner.state.borrow_mut();
        state.current_animation_for_tag.remove(&tag);
        state.mutable_values_for_tag.remove(&tag);
    }

    fn start_observing(&self, tag: Tag, value: &MutableValue<StyleProps>, kind: LayoutAnimationType) {
        let observer = Rc::clone(&self.inner.observer);
        let is_shared = kind.is_shared_transition();
        let id = value.subscribe(move |props| observer.notify_progress(tag, props, is_shared));
        let previous = self
            .inner
            .state
            .borrow_mut()
            .progress_subscriptions
            .insert(tag, id);
        if let Some(previous) = previous {
            value.unsubscribe(previous);
        }
    }

    /// Detach the tag's progress listener and report the end to the observer.
    fn stop_observing(&self, tag: Tag, remove_view: bool) {
        let (id, value) = {
            let mut state = self.inner.state.borrow_mut();
            (
                state.progress_subscriptions.remove(&tag),
                state.mutable_values_for_tag.get(&tag).cloned(),
            )
        };
        if let (Some(id), Some(value)) = (id, value) {
            value.unsubscribe(id);
        }
        self.inner.observer.notify_end(tag, remove_view);
    }
}

impl fmt::Debug for LayoutAnimationsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutAnimationsManager")
            .field("active_tags", &self.active_tags())
            .field("timing", &self.inner.timing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glide_core::{AnimationDescriptor, EasingFunction};
    use std::cell::Cell;

    #[derive(Default)]
    struct RecordingObserver {
        progress: RefCell<Vec<(Tag, StyleProps, bool)>>,
        ends: RefCell<Vec<(Tag, bool)>>,
    }

    impl ProgressObserver for RecordingObserver {
        fn notify_progress(&self, tag: Tag, value: &StyleProps, is_shared_transition: bool) {
            self.progress
                .borrow_mut()
                .push((tag, value.clone(), is_shared_transition));
        }

        fn notify_end(&self, tag: Tag, remove_view: bool) {
            self.ends.borrow_mut().push((tag, remove_view));
        }
    }

    #[derive(Default)]
    struct RecordingCoordinator {
        started: RefCell<Vec<Tag>>,
    }

    impl SharedTransitionCoordinator for RecordingCoordinator {
        fn on_transition_start(&self, tag: Tag, _measured: &StyleProps) {
            self.started.borrow_mut().push(tag);
        }
    }

    fn linear(to: f64, duration_ms: f64) -> AnimationDescriptor {
        AnimationDescriptor::timing(to, duration_ms).with_easing(EasingFunction::Linear)
    }

    fn setup(timing: StartTiming) -> (FrameScheduler, Rc<RecordingObserver>, LayoutAnimationsManager) {
        let scheduler = FrameScheduler::new();
        let observer = Rc::new(RecordingObserver::default());
        let manager = LayoutAnimationsManager::new(
            scheduler.clone(),
            observer.clone(),
            Rc::new(NoopCoordinator),
            timing,
        );
        (scheduler, observer, manager)
    }

    fn run_until_idle(scheduler: &FrameScheduler, mut ts: f64) -> f64 {
        while scheduler.pending_frame_callbacks() > 0 && ts < 10_000.0 {
            scheduler.run_frame(ts);
            ts += 16.0;
        }
        ts
    }

    #[test]
    fn test_restart_merges_specs() {
        let (scheduler, _observer, manager) = setup(StartTiming::Immediate);
        manager.start(Tag(1), LayoutAnimationType::Layout, StyleProps::new(), |_| {
            LayoutAnimationConfig::new(
                StyleProps::new().with("x", 0.0).with("y", 0.0),
                AnimationSpec::new()
                    .with("x", linear(100.0, 200.0))
                    .with("y", linear(100.0, 200.0)),
            )
        });
        scheduler.run_frame(0.0);
        scheduler.run_frame(50.0);

        manager.start(Tag(1), LayoutAnimationType::Layout, StyleProps::new(), |_| {
            LayoutAnimationConfig::new(
                StyleProps::new(),
                AnimationSpec::new()
                    .with("y", linear(300.0, 200.0))
                    .with("width", linear(40.0, 200.0)),
            )
        });

        let spec = manager.current_animation(Tag(1)).unwrap();
        assert_eq!(spec.len(), 3);
        assert_eq!(spec.get("x").unwrap().target().as_f64(), Some(100.0));
        assert_eq!(spec.get("y").unwrap().target().as_f64(), Some(300.0));
        assert_eq!(spec.get("width").unwrap().target().as_f64(), Some(40.0));

        // Untouched property keeps its in-flight value
        let x = manager.value(Tag(1)).unwrap().borrow().get_f64("x").unwrap();
        assert!(x > 0.0 && x < 100.0);

        run_until_idle(&scheduler, 66.0);
        assert!(!manager.has_state(Tag(1)));
    }

    #[test]
    fn test_interrupted_callback_keeps_state() {
        let (scheduler, _observer, manager) = setup(StartTiming::Immediate);
        let results = Rc::new(RefCell::new(Vec::new()));

        let r = results.clone();
        manager.start(Tag(2), LayoutAnimationType::Entering, StyleProps::new(), move |_| {
            LayoutAnimationConfig::new(
                StyleProps::new().with("opacity", 0.0),
                AnimationSpec::new().with("opacity", linear(1.0, 100.0)),
            )
            .with_callback(move |finished| r.borrow_mut().push(finished))
        });
        scheduler.run_frame(0.0);

        let r = results.clone();
        manager.start(Tag(2), LayoutAnimationType::Entering, StyleProps::new(), move |_| {
            LayoutAnimationConfig::new(StyleProps::new(), AnimationSpec::new())
                .with_callback(move |finished| r.borrow_mut().push(finished))
        });
        assert_eq!(*results.borrow(), vec![false]);
        assert!(manager.has_state(Tag(2)));

        run_until_idle(&scheduler, 16.0);
        assert_eq!(*results.borrow(), vec![false, true]);
        assert!(!manager.has_state(Tag(2)));
    }

    #[test]
    fn test_exit_removes_view_only_when_finished() {
        let (scheduler, observer, manager) = setup(StartTiming::Immediate);
        manager.start(Tag(8), LayoutAnimationType::Exiting, StyleProps::new(), |_| {
            LayoutAnimationConfig::new(
                StyleProps::new().with("opacity", 1.0),
                AnimationSpec::new().with("opacity", linear(0.0, 50.0)),
            )
        });
        scheduler.run_frame(0.0);
        assert!(observer.ends.borrow().is_empty());

        run_until_idle(&scheduler, 16.0);
        assert_eq!(*observer.ends.borrow(), vec![(Tag(8), true)]);
    }

    #[test]
    fn test_stop_without_state_is_noop() {
        let (_scheduler, observer, manager) = setup(StartTiming::Immediate);
        manager.stop(Tag(42));
        assert!(observer.ends.borrow().is_empty());
    }

    #[test]
    fn test_stop_detaches_progress() {
        let (scheduler, observer, manager) = setup(StartTiming::Immediate);
        manager.start(Tag(3), LayoutAnimationType::Layout, StyleProps::new(), |_| {
            LayoutAnimationConfig::new(
                StyleProps::new().with("x", 0.0),
                AnimationSpec::new().with("x", linear(10.0, 100.0)),
            )
        });
        scheduler.run_frame(0.0);
        let before = observer.progress.borrow().len();

        manager.stop(Tag(3));
        assert_eq!(*observer.ends.borrow(), vec![(Tag(3), false)]);
        assert_eq!(manager.value(Tag(3)).unwrap().listener_count(), 0);

        scheduler.run_frame(16.0);
        assert_eq!(observer.progress.borrow().len(), before);
    }

    #[test]
    fn test_progress_shares_value_with_other_listeners() {
        let (scheduler, observer, manager) = setup(StartTiming::Immediate);
        manager.start(Tag(4), LayoutAnimationType::SharedElementTransition, StyleProps::new(), |_| {
            LayoutAnimationConfig::new(
                StyleProps::new().with("x", 0.0),
                AnimationSpec::new().with("x", linear(10.0, 100.0)),
            )
        });
        let value = manager.value(Tag(4)).unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        value.subscribe(move |_| h.set(h.get() + 1));

        scheduler.run_frame(0.0);
        assert_eq!(hits.get(), 1);
        assert!(observer.progress.borrow().iter().all(|(_, _, shared)| *shared));

        manager.stop(Tag(4));
        scheduler.run_frame(16.0);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_forget_interrupts_without_notifying() {
        let (scheduler, observer, manager) = setup(StartTiming::Immediate);
        let results = Rc::new(RefCell::new(Vec::new()));
        let r = results.clone();
        manager.start(Tag(5), LayoutAnimationType::Entering, StyleProps::new(), move |_| {
            LayoutAnimationConfig::new(
                StyleProps::new().with("opacity", 0.0),
                AnimationSpec::new().with("opacity", linear(1.0, 100.0)),
            )
            .with_callback(move |finished| r.borrow_mut().push(finished))
        });
        scheduler.run_frame(0.0);
        let value = manager.value(Tag(5)).unwrap();
        let progress_before = observer.progress.borrow().len();

        assert!(manager.forget(Tag(5)));
        assert!(!manager.forget(Tag(5)));
        assert!(!manager.has_state(Tag(5)));
        assert!(manager.active_tags().is_empty());
        assert_eq!(*results.borrow(), vec![false]);
        assert!(!value.is_animating());
        assert_eq!(value.listener_count(), 0);

        run_until_idle(&scheduler, 16.0);
        assert_eq!(observer.progress.borrow().len(), progress_before);
        assert!(observer.ends.borrow().is_empty());
    }

    #[test]
    fn test_progress_variant_goes_to_coordinator() {
        let scheduler = FrameScheduler::new();
        let coordinator = Rc::new(RecordingCoordinator::default());
        let manager = LayoutAnimationsManager::new(
            scheduler.clone(),
            Rc::new(RecordingObserver::default()),
            coordinator.clone(),
            StartTiming::Immediate,
        );
        let called = Rc::new(Cell::new(false));
        let c = called.clone();

        manager.start(
            Tag(6),
            LayoutAnimationType::SharedElementTransitionProgress,
            StyleProps::new().with("width", 10.0),
            move |_| {
                c.set(true);
                LayoutAnimationConfig::new(StyleProps::new(), AnimationSpec::new())
            },
        );

        assert_eq!(*coordinator.started.borrow(), vec![Tag(6)]);
        assert!(!called.get());
        assert!(!manager.has_state(Tag(6)));
    }

    #[test]
    fn test_deferred_start_waits_for_frame() {
        let (scheduler, _observer, manager) = setup(StartTiming::NextFrame);
        manager.start(Tag(9), LayoutAnimationType::Entering, StyleProps::new(), |_| {
            LayoutAnimationConfig::new(
                StyleProps::new().with("opacity", 0.0),
                AnimationSpec::new().with("opacity", linear(1.0, 100.0)),
            )
        });
        assert!(!manager.has_state(Tag(9)));

        scheduler.run_frame(0.0);
        assert!(manager.has_state(Tag(9)));
        assert_eq!(manager.active_tags(), vec![Tag(9)]);
    }
}
