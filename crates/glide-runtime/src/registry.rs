//! Control-thread registry of live animated components.
//!
//! When an animation settles, the render thread hands the final prop snapshot
//! to the control thread, which looks up the component registered for the tag
//! and pushes the snapshot into it directly.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use glide_core::{StyleProps, Tag};

/// A component instance that accepts settled animated props.
pub trait AnimatedComponent {
    /// Apply the last known animated props, bypassing the declarative render path.
    fn update_animated_props(&self, props: &StyleProps);
}

/// Tag → component mapping owned by the control thread.
#[derive(Default)]
pub struct ComponentRegistry {
    components: HashMap<Tag, Rc<dyn AnimatedComponent>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component for `tag`. A later registration for the same tag wins.
    pub fn register(&mut self, tag: Tag, component: Rc<dyn AnimatedComponent>) {
        self.components.insert(tag, component);
    }

    pub fn unregister(&mut self, tag: Tag) -> Option<Rc<dyn AnimatedComponent>> {
        self.components.remove(&tag)
    }

    pub fn get_component(&self, tag: Tag) -> Option<Rc<dyn AnimatedComponent>> {
        self.components.get(&tag).cloned()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.components.keys().copied().collect();
        tags.sort();
        f.debug_struct("ComponentRegistry").field("tags", &tags).finish()
    }
}

/// Push settled props into the component registered for `tag`.
///
/// A missing component is the expected race between unmount and an in-flight
/// handoff; the snapshot is dropped and `false` returned.
pub fn update_props_on_control_thread(registry: &ComponentRegistry, tag: Tag, props: &StyleProps) -> bool {
    match registry.get_component(tag) {
        Some(component) => {
            component.update_animated_props(props);
            true
        }
        None => {
            log::debug!("dropping settled props for unmounted view {tag}");
            false
        }
    }
}
