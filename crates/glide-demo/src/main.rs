use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use glide_config::GlideConfig;
use glide_core::{AnimationDescriptor, AnimationSpec, EasingFunction, MutableValue, StyleProps, Tag};
use glide_runtime::{
    AnimatedComponent, AnimatedPropsStore, ComponentRegistry, LayoutAnimationConfig,
    LayoutAnimationType, PaperCommit, PaperOperation, ProgressObserver, PropsUpdater, UiRuntime,
    ViewDescriptor, ViewDescriptors, WebCommit, control_channel,
};

const CARD: Tag = Tag(1);

/// Control-thread component that logs the settled props it receives.
struct Card;

impl AnimatedComponent for Card {
    fn update_animated_props(&self, props: &StyleProps) {
        log::info!("control thread: {CARD} settled at {props:?}");
    }
}

/// Native progress observer that writes each frame through the prop pipeline.
struct ForwardingObserver {
    updater: RefCell<Option<PropsUpdater>>,
    views: ViewDescriptors,
}

impl ProgressObserver for ForwardingObserver {
    fn notify_progress(&self, tag: Tag, value: &StyleProps, _is_shared_transition: bool) {
        if let Some(updater) = self.updater.borrow().as_ref() {
            if let Err(err) = updater.update(&self.views, value.clone(), true) {
                log::warn!("dropping frame for {tag}: {err}");
            }
        }
    }

    fn notify_end(&self, tag: Tag, remove_view: bool) {
        log::info!("render thread: layout animation for {tag} ended (remove view: {remove_view})");
    }
}

struct LoggingPaper;

impl PaperCommit for LoggingPaper {
    fn commit(&self, batch: &[PaperOperation]) {
        log::debug!("paper commit of {} operations", batch.len());
    }
}

struct LoggingWeb;

impl WebCommit for LoggingWeb {
    fn apply(&self, tag: Tag, updates: &StyleProps, _is_animated_props: bool) {
        log::debug!("web apply {updates:?} to {tag}");
    }
}

fn load_config() -> Result<GlideConfig> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => GlideConfig::load_from_file(&path)?,
        None => GlideConfig::load_or_default(),
    };
    config.merge_with_env();
    Ok(config)
}

fn fade(to: f64, duration_ms: f64) -> AnimationSpec {
    AnimationSpec::new().with(
        "opacity",
        AnimationDescriptor::timing(to, duration_ms).with_easing(EasingFunction::EaseOut),
    )
}

/// Drive display refreshes at the configured interval until nothing is pending.
fn run_frames(runtime: &UiRuntime, clock: Instant) {
    let interval = Duration::from_secs_f64(runtime.config().frame.interval_ms / 1000.0);
    while runtime.scheduler().pending_frame_callbacks() > 0 {
        thread::sleep(interval);
        runtime.tick(clock.elapsed().as_secs_f64() * 1000.0);
    }
}

fn main() -> Result<()> {
    let _ = env_logger::try_init();
    let config = load_config()?;

    let (dispatcher, queue) = control_channel();
    let control = thread::spawn(move || {
        let mut registry = ComponentRegistry::new();
        registry.register(CARD, Rc::new(Card));
        queue.run(&registry)
    });

    let store = AnimatedPropsStore::new();
    let observer = Rc::new(ForwardingObserver {
        updater: RefCell::new(None),
        views: MutableValue::new(vec![ViewDescriptor::new(CARD)]),
    });
    let runtime = UiRuntime::builder(config)
        .with_dispatcher(dispatcher)
        .with_fabric_commit(Rc::new(store.clone()))
        .with_paper_commit(Rc::new(LoggingPaper))
        .with_web_commit(Rc::new(LoggingWeb))
        .with_progress_observer(observer.clone())
        .build()?;
    *observer.updater.borrow_mut() = Some(runtime.props_updater().clone());

    let clock = Instant::now();
    runtime.start_layout_animation(
        CARD,
        LayoutAnimationType::Entering,
        StyleProps::new().with("width", 120.0).with("height", 80.0),
        |_| {
            LayoutAnimationConfig::new(StyleProps::new().with("opacity", 0.0), fade(1.0, 250.0))
                .with_callback(|finished| log::info!("entering finished: {finished}"))
        },
    );
    run_frames(&runtime, clock);

    runtime.start_layout_animation(CARD, LayoutAnimationType::Exiting, StyleProps::new(), |_| {
        LayoutAnimationConfig::new(StyleProps::new(), fade(0.0, 200.0))
    });
    run_frames(&runtime, clock);

    log::info!(
        "render thread: {} frames, {} native commits",
        runtime.scheduler().frames_run(),
        store.commit_count()
    );
    runtime.unregister_view(CARD);

    // Dropping the render side closes the channel and ends the control loop
    drop(observer);
    drop(runtime);
    let delivered = control
        .join()
        .map_err(|_| anyhow!("control thread panicked"))?;
    log::info!("control thread applied {delivered} settled snapshots");
    Ok(())
}
