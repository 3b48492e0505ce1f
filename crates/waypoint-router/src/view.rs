//! Views rendered into the outlet and their lifecycle hooks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use waypoint_path::Params;

use crate::action::Redirect;
use crate::location::Location;
use crate::route::BoxFuture;
use crate::router::Router;

/// A shared view instance.
pub type ViewHandle = Arc<dyn View>;

/// Returns whether two handles point at the same view instance.
pub fn same_view(a: &ViewHandle, b: &ViewHandle) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

pub(crate) fn view_addr(view: &ViewHandle) -> usize {
    Arc::as_ptr(view) as *const () as usize
}

/// What a `before` hook wants the navigation to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HookOutcome {
    /// Continue with the navigation.
    #[default]
    Proceed,
    /// Abandon the navigation and keep the current location.
    Cancel,
    /// Navigate elsewhere instead.
    Redirect(Redirect),
}

/// Helpers passed to `before` hooks.
#[derive(Debug, Clone)]
pub struct HookCommands {
    from: String,
    params: Params,
}

impl HookCommands {
    pub(crate) fn new(from: String, params: Params) -> Self {
        Self { from, params }
    }

    /// Cancels the navigation.
    pub fn prevent(&self) -> HookOutcome {
        HookOutcome::Cancel
    }

    /// Redirects to `pathname`, a template filled from the target params.
    pub fn redirect(&self, pathname: impl Into<String>) -> HookOutcome {
        HookOutcome::Redirect(Redirect {
            pathname: pathname.into(),
            from: self.from.clone(),
            params: self.params.clone(),
        })
    }
}

/// A view component.
///
/// Every method except [`tag_name`](View::tag_name) has a no-op default.
pub trait View: Send + Sync {
    /// Tag name; router-created views with equal tags are interchangeable.
    fn tag_name(&self) -> &str;

    /// Receives the location the view is rendered for.
    fn set_location(&self, _location: Arc<Location>) {}

    /// Runs before the view is attached. May cancel or redirect.
    fn on_before_enter(
        &self,
        _location: Arc<Location>,
        _commands: HookCommands,
        _router: Router,
    ) -> BoxFuture<'_, HookOutcome> {
        Box::pin(async { HookOutcome::Proceed })
    }

    /// Runs before the view is detached. May cancel; redirects are ignored.
    fn on_before_leave(
        &self,
        _location: Arc<Location>,
        _commands: HookCommands,
        _router: Router,
    ) -> BoxFuture<'_, HookOutcome> {
        Box::pin(async { HookOutcome::Proceed })
    }

    /// Runs after the view was attached.
    fn on_after_enter(&self, _location: Arc<Location>, _router: Router) {}

    /// Runs after the view was replaced.
    fn on_after_leave(&self, _location: Arc<Location>, _router: Router) {}

    /// Plays the animation bound to `class` and resolves when it ends.
    ///
    /// Views without an animation resolve immediately.
    fn animate(&self, _class: &str) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// A view placed in a route chain.
#[derive(Clone)]
pub struct Element {
    view: ViewHandle,
    created_by_router: bool,
}

impl Element {
    /// Wraps a view created outside the router.
    ///
    /// External elements are only reused when the exact same instance is
    /// rendered again.
    pub fn external(view: ViewHandle) -> Self {
        Self {
            view,
            created_by_router: false,
        }
    }

    pub(crate) fn created(view: ViewHandle) -> Self {
        Self {
            view,
            created_by_router: true,
        }
    }

    /// The wrapped view.
    pub fn view(&self) -> &ViewHandle {
        &self.view
    }

    /// The view's tag name.
    pub fn tag_name(&self) -> &str {
        self.view.tag_name()
    }

    /// Returns whether the router created this element.
    pub fn is_created_by_router(&self) -> bool {
        self.created_by_router
    }

    /// Returns whether both wrap the same instance.
    pub fn same_instance(&self, other: &Element) -> bool {
        same_view(&self.view, &other.view)
    }

    /// Returns whether `other` can stand in for this element.
    ///
    /// Router-created elements match by tag name, anything else only by
    /// instance.
    pub fn is_reusable_with(&self, other: &Element) -> bool {
        if self.created_by_router && other.created_by_router {
            self.tag_name() == other.tag_name()
        } else {
            self.same_instance(other)
        }
    }
}

/// Reusability of two optional elements; a missing element never matches.
pub(crate) fn is_reusable(a: Option<&Element>, b: Option<&Element>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.is_reusable_with(b),
        _ => false,
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag_name", &self.tag_name())
            .field("created_by_router", &self.created_by_router)
            .finish()
    }
}

/// Creates views by tag name.
pub trait ViewFactory: Send + Sync {
    /// Creates a fresh view for `tag_name`.
    fn create(&self, tag_name: &str) -> ViewHandle;
}

type Constructor = Arc<dyn Fn() -> ViewHandle + Send + Sync>;

/// A [`ViewFactory`] backed by registered constructors.
///
/// Unregistered tags produce a [`PlainView`].
#[derive(Default)]
pub struct ViewRegistry {
    constructors: RwLock<HashMap<String, Constructor>>,
}

impl ViewRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the constructor for `tag_name`, replacing any previous one.
    pub fn register<F>(&self, tag_name: impl Into<String>, constructor: F)
    where
        F: Fn() -> ViewHandle + Send + Sync + 'static,
    {
        self.constructors
            .write()
            .insert(tag_name.into(), Arc::new(constructor));
    }

    /// Returns whether `tag_name` has a constructor.
    pub fn is_registered(&self, tag_name: &str) -> bool {
        self.constructors.read().contains_key(tag_name)
    }
}

impl ViewFactory for ViewRegistry {
    fn create(&self, tag_name: &str) -> ViewHandle {
        let constructor = self.constructors.read().get(tag_name).cloned();
        match constructor {
            Some(constructor) => constructor(),
            None => Arc::new(PlainView::new(tag_name)),
        }
    }
}

impl fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.constructors.read().keys().cloned().collect();
        tags.sort();
        f.debug_struct("ViewRegistry").field("tags", &tags).finish()
    }
}

/// A view with no behavior besides remembering its location.
#[derive(Debug)]
pub struct PlainView {
    tag_name: String,
    location: Mutex<Option<Arc<Location>>>,
}

impl PlainView {
    /// Creates a view with the given tag.
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            location: Mutex::new(None),
        }
    }

    /// The last location assigned to the view.
    pub fn location(&self) -> Option<Arc<Location>> {
        self.location.lock().clone()
    }
}

impl View for PlainView {
    fn tag_name(&self) -> &str {
        &self.tag_name
    }

    fn set_location(&self, location: Arc<Location>) {
        *self.location.lock() = Some(location);
    }
}
