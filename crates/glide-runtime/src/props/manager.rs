//! Backend selection and the `update_props` entry point.

use std::fmt;
use std::rc::Rc;

use glide_config::BackendKind;
use glide_core::{FrameScheduler, StyleProps};

use super::fabric::FabricPropsManager;
use super::ledger::UpdateLedger;
use super::paper::PaperPropsManager;
use super::{PropsProcessor, ViewDescriptor, ViewDescriptors, WebCommit};
use crate::error::{GlideError, Result};

/// Prop update manager chosen once at startup.
#[derive(Debug, Clone)]
pub enum UpdatePropsManager {
    Fabric(FabricPropsManager),
    Paper(PaperPropsManager),
    /// No native commit primitive exists in this environment. Every call fails
    /// unless running under a test harness, where calls are inert.
    Unavailable { test_harness: bool },
}

impl UpdatePropsManager {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Fabric(_) => BackendKind::Fabric,
            Self::Paper(_) => BackendKind::Paper,
            Self::Unavailable { .. } => BackendKind::Web,
        }
    }

    /// Probe whether a native backend is present. Never fails.
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable { .. })
    }

    pub fn update(&self, descriptors: &[ViewDescriptor], updates: &StyleProps) -> Result<()> {
        match self {
            Self::Fabric(manager) => manager.update(descriptors, updates),
            Self::Paper(manager) => manager.update(descriptors, updates),
            Self::Unavailable { test_harness } => return Self::unavailable(*test_harness),
        }
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        match self {
            Self::Fabric(manager) => manager.flush(),
            Self::Paper(manager) => manager.flush(),
            Self::Unavailable { test_harness } => return Self::unavailable(*test_harness),
        }
        Ok(())
    }

    fn unavailable(test_harness: bool) -> Result<()> {
        if test_harness {
            Ok(())
        } else {
            Err(GlideError::ManagerUnavailable)
        }
    }
}

/// Where animated prop updates enter the commit pipeline.
#[derive(Clone)]
pub enum PropsUpdater {
    /// Record into the ledger (Fabric only), process, then batch through the manager.
    Native {
        manager: UpdatePropsManager,
        ledger: UpdateLedger,
        scheduler: FrameScheduler,
        processor: Rc<dyn PropsProcessor>,
    },
    /// Apply synchronously to each element. No batching, no settle detection.
    Web { committer: Rc<dyn WebCommit> },
}

impl PropsUpdater {
    /// Push `updates` to every view in `view_descriptors`.
    pub fn update(
        &self,
        view_descriptors: &ViewDescriptors,
        mut updates: StyleProps,
        is_animated_props: bool,
    ) -> Result<()> {
        match self {
            Self::Native {
                manager,
                ledger,
                scheduler,
                processor,
            } => {
                let descriptors = view_descriptors.borrow();
                // The ledger keeps the unprocessed values for the control thread.
                // Only Fabric settles and clears it.
                if matches!(manager, UpdatePropsManager::Fabric(_)) {
                    let frame_time = scheduler.frame_timestamp();
                    for descriptor in descriptors.iter() {
                        ledger.record(descriptor.tag, &updates, frame_time);
                    }
                }
                processor.process(&mut updates);
                log::trace!("update {} props on {} views", updates.len(), descriptors.len());
                manager.update(&descriptors, &updates)
            }
            Self::Web { committer } => {
                view_descriptors.with(|descriptors| {
                    for descriptor in descriptors {
                        committer.apply(descriptor.tag, &updates, is_animated_props);
                    }
                });
                Ok(())
            }
        }
    }

    pub fn manager(&self) -> Option<&UpdatePropsManager> {
        match self {
            Self::Native { manager, .. } => Some(manager),
            Self::Web { .. } => None,
        }
    }
}

impl fmt::Debug for PropsUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native { manager, .. } => f.debug_tuple("Native").field(manager).finish(),
            Self::Web { .. } => f.write_str("Web"),
        }
    }
}
