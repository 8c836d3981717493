//! Render-thread runtime wiring.
//!
//! One [`UiRuntime`] per application instance owns the frame scheduler, the
//! update ledger, the selected prop update backend and the layout animation
//! manager. Nothing here is global, so several runtimes can coexist in one
//! process.

use std::fmt;
use std::rc::Rc;

use glide_config::{BackendKind, GlideConfig};
use glide_core::{FrameScheduler, StyleProps, Tag};

use crate::dispatch::ControlDispatcher;
use crate::error::{GlideError, Result};
use crate::layout::{
    LayoutAnimationConfig, LayoutAnimationType, LayoutAnimationsManager, NoopCoordinator,
    ProgressObserver, SharedTransitionCoordinator, StartTiming,
};
use crate::props::{
    FabricCommit, FabricPropsManager, PaperCommit, PaperPropsManager, PassthroughProcessor,
    PropsProcessor, PropsUpdater, UpdateLedger, UpdatePropsManager, ViewDescriptors, WebCommit,
};

/// Collects the collaborators a [`UiRuntime`] needs.
pub struct UiRuntimeBuilder {
    config: GlideConfig,
    scheduler: FrameScheduler,
    dispatcher: Option<ControlDispatcher>,
    fabric: Option<Rc<dyn FabricCommit>>,
    paper: Option<Rc<dyn PaperCommit>>,
    web: Option<Rc<dyn WebCommit>>,
    processor: Rc<dyn PropsProcessor>,
    observer: Option<Rc<dyn ProgressObserver>>,
    coordinator: Rc<dyn SharedTransitionCoordinator>,
}

impl UiRuntimeBuilder {
    pub fn new(config: GlideConfig) -> Self {
        Self {
            config,
            scheduler: FrameScheduler::new(),
            dispatcher: None,
            fabric: None,
            paper: None,
            web: None,
            processor: Rc::new(PassthroughProcessor),
            observer: None,
            coordinator: Rc::new(NoopCoordinator),
        }
    }

    /// Share an existing scheduler instead of creating one.
    pub fn with_scheduler(mut self, scheduler: FrameScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: ControlDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn with_fabric_commit(mut self, commit: Rc<dyn FabricCommit>) -> Self {
        self.fabric = Some(commit);
        self
    }

    pub fn with_paper_commit(mut self, commit: Rc<dyn PaperCommit>) -> Self {
        self.paper = Some(commit);
        self
    }

    pub fn with_web_commit(mut self, commit: Rc<dyn WebCommit>) -> Self {
        self.web = Some(commit);
        self
    }

    pub fn with_processor(mut self, processor: Rc<dyn PropsProcessor>) -> Self {
        self.processor = processor;
        self
    }

    pub fn with_progress_observer(mut self, observer: Rc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_coordinator(mut self, coordinator: Rc<dyn SharedTransitionCoordinator>) -> Self {
        self.coordinator = coordinator;
        self
    }

    /// Select the backend named by the configuration and wire everything up.
    pub fn build(self) -> Result<UiRuntime> {
        self.config.validate()?;
        let observer = self
            .observer
            .ok_or(GlideError::MissingCollaborator("a progress observer"))?;
        let ledger = UpdateLedger::new();
        let props = &self.config.props;

        let (manager, updater) = match props.backend {
            BackendKind::Fabric => {
                let commit = self
                    .fabric
                    .ok_or(GlideError::MissingCollaborator("a fabric commit primitive"))?;
                let dispatcher = self
                    .dispatcher
                    .ok_or(GlideError::MissingCollaborator("a control-thread dispatcher"))?;
                let manager = UpdatePropsManager::Fabric(FabricPropsManager::new(
                    self.scheduler.clone(),
                    ledger.clone(),
                    dispatcher,
                    commit,
                    props.settle_threshold_ms,
                ));
                let updater = native_updater(&manager, &ledger, &self.scheduler, self.processor);
                (manager, updater)
            }
            BackendKind::Paper => {
                let commit = self
                    .paper
                    .ok_or(GlideError::MissingCollaborator("a paper commit primitive"))?;
                let manager = UpdatePropsManager::Paper(PaperPropsManager::new(
                    self.scheduler.clone(),
                    commit,
                    props.default_view_name.clone(),
                ));
                let updater = native_updater(&manager, &ledger, &self.scheduler, self.processor);
                (manager, updater)
            }
            BackendKind::Web => {
                let committer = self
                    .web
                    .ok_or(GlideError::MissingCollaborator("a web prop setter"))?;
                (
                    UpdatePropsManager::Unavailable {
                        test_harness: props.test_harness,
                    },
                    PropsUpdater::Web { committer },
                )
            }
        };
        log::info!(
            "glide runtime using {:?} backend (settle threshold {}ms)",
            props.backend,
            props.settle_threshold_ms
        );

        let layout = LayoutAnimationsManager::new(
            self.scheduler.clone(),
            observer,
            self.coordinator,
            StartTiming::from_config(&self.config.layout),
        );

        Ok(UiRuntime {
            config: self.config,
            scheduler: self.scheduler,
            ledger,
            manager,
            updater,
            layout,
        })
    }
}

fn native_updater(
    manager: &UpdatePropsManager,
    ledger: &UpdateLedger,
    scheduler: &FrameScheduler,
    processor: Rc<dyn PropsProcessor>,
) -> PropsUpdater {
    PropsUpdater::Native {
        manager: manager.clone(),
        ledger: ledger.clone(),
        scheduler: scheduler.clone(),
        processor,
    }
}

/// The render-thread side of one application instance.
pub struct UiRuntime {
    config: GlideConfig,
    scheduler: FrameScheduler,
    ledger: UpdateLedger,
    manager: UpdatePropsManager,
    updater: PropsUpdater,
    layout: LayoutAnimationsManager,
}

impl UiRuntime {
    pub fn builder(config: GlideConfig) -> UiRuntimeBuilder {
        UiRuntimeBuilder::new(config)
    }

    /// Push animated props to every view in `views`.
    pub fn update_props(
        &self,
        views: &ViewDescriptors,
        updates: StyleProps,
        is_animated_props: bool,
    ) -> Result<()> {
        self.updater.update(views, updates, is_animated_props)
    }

    /// Commit pending updates now instead of waiting for the microtask.
    pub fn flush(&self) -> Result<()> {
        self.manager.flush()
    }

    pub fn start_layout_animation(
        &self,
        tag: Tag,
        kind: LayoutAnimationType,
        measured: StyleProps,
        config: impl FnOnce(&StyleProps) -> LayoutAnimationConfig + 'static,
    ) {
        self.layout.start(tag, kind, measured, config);
    }

    pub fn stop_layout_animation(&self, tag: Tag) {
        self.layout.stop(tag);
    }

    /// Drop every piece of per-tag state for a view that no longer exists.
    pub fn unregister_view(&self, tag: Tag) {
        match &self.manager {
            UpdatePropsManager::Fabric(manager) => manager.forget(tag),
            _ => self.ledger.forget(tag),
        }
        self.layout.forget(tag);
        log::debug!("unregistered view {tag}");
    }

    /// Process one display refresh.
    pub fn tick(&self, timestamp: f64) -> usize {
        self.scheduler.run_frame(timestamp)
    }

    pub fn config(&self) -> &GlideConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn ledger(&self) -> &UpdateLedger {
        &self.ledger
    }

    /// Entry point for collaborators that push props on their own.
    pub fn props_updater(&self) -> &PropsUpdater {
        &self.updater
    }

    pub fn manager(&self) -> &UpdatePropsManager {
        &self.manager
    }

    pub fn layout(&self) -> &LayoutAnimationsManager {
        &self.layout
    }
}

impl fmt::Debug for UiRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiRuntime")
            .field("backend", &self.manager.kind())
            .field("scheduler", &self.scheduler)
            .field("layout", &self.layout)
            .finish()
    }
}
