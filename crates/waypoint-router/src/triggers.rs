//! Sources of navigation requests.
//!
//! A trigger turns host events into [`GO_EVENT`](crate::GO_EVENT)s on the
//! window it is activated on. Triggers are installed per window with
//! [`Window::set_triggers`], which owns their activate/inactivate lifecycle.

use parking_lot::Mutex;
use tracing::debug;

use crate::window::{
    Event, ListenerId, NavigationTarget, Window, WindowEvent, CLICK_EVENT, IGNORE_POPSTATE_STATE,
    POPSTATE_EVENT,
};

/// A source of navigation requests.
pub trait NavigationTrigger: Send + Sync {
    /// Starts listening on `window`.
    fn activate(&self, window: &Window);

    /// Stops listening on `window`.
    fn inactivate(&self, window: &Window);
}

/// A node on a click's composed path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Lower-case tag name.
    pub name: String,
    /// `href` of an anchor.
    pub href: Option<String>,
    /// `target` attribute.
    pub target: Option<String>,
    /// Names of boolean attributes such as `download`.
    pub attributes: Vec<String>,
}

impl Node {
    /// An element with the given tag.
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// An `<a href>`.
    pub fn anchor(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Self::element("a")
        }
    }

    /// Sets the `target` attribute.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Adds a boolean attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    /// Returns whether the attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    fn is_anchor(&self) -> bool {
        self.name == "a"
    }
}

/// A mouse click.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickEvent {
    /// Mouse button; 0 is the main button.
    pub button: i16,
    /// Shift held.
    pub shift_key: bool,
    /// Ctrl held.
    pub ctrl_key: bool,
    /// Alt held.
    pub alt_key: bool,
    /// Meta held.
    pub meta_key: bool,
    /// Nodes from the target up to the document root.
    pub path: Vec<Node>,
}

impl ClickEvent {
    /// A plain main-button click on `path[0]`.
    pub fn on(path: Vec<Node>) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    fn has_modifier(&self) -> bool {
        self.shift_key || self.ctrl_key || self.alt_key || self.meta_key
    }
}

/// Intercepts same-origin link clicks.
#[derive(Debug, Default)]
pub struct ClickTrigger {
    listener: Mutex<Option<ListenerId>>,
}

impl ClickTrigger {
    /// Creates an inactive trigger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Where a click should navigate, if the router should handle it.
    pub fn navigation_target(window: &Window, click: &ClickEvent) -> Option<NavigationTarget> {
        if click.button != 0 || click.has_modifier() {
            return None;
        }

        let anchor = click.path.iter().find(|node| node.is_anchor())?;
        if anchor
            .target
            .as_deref()
            .is_some_and(|target| !target.is_empty() && !target.eq_ignore_ascii_case("_self"))
        {
            return None;
        }
        if anchor.has_attribute("download") || anchor.has_attribute("router-ignore") {
            return None;
        }

        let url = window.resolve(anchor.href.as_deref()?).ok()?;
        let target = NavigationTarget::from_url(&url);
        let current = window.location();
        if target.pathname == current.pathname && !target.hash.is_empty() {
            return None;
        }
        if url.origin().ascii_serialization() != window.origin() {
            return None;
        }
        Some(target)
    }

    fn handle(window: &Window, event: &Event) {
        let WindowEvent::Click(click) = event.payload() else {
            return;
        };
        if event.default_prevented() {
            return;
        }
        let Some(target) = Self::navigation_target(window, click) else {
            return;
        };

        debug!(href = %target.href(), "intercepted link click");
        if !window.dispatch(WindowEvent::Go(target)) {
            event.prevent_default();
            window.scroll_to(0, 0);
        }
    }
}

impl NavigationTrigger for ClickTrigger {
    fn activate(&self, window: &Window) {
        let weak = window.downgrade();
        let id = window.add_event_listener(CLICK_EVENT, move |event| {
            if let Some(window) = weak.upgrade() {
                Self::handle(&window, event);
            }
        });
        if let Some(previous) = self.listener.lock().replace(id) {
            window.remove_event_listener(previous);
        }
    }

    fn inactivate(&self, window: &Window) {
        if let Some(id) = self.listener.lock().take() {
            window.remove_event_listener(id);
        }
    }
}

/// Turns history traversal into navigation requests.
#[derive(Debug, Default)]
pub struct PopStateTrigger {
    listener: Mutex<Option<ListenerId>>,
}

impl PopStateTrigger {
    /// Creates an inactive trigger.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NavigationTrigger for PopStateTrigger {
    fn activate(&self, window: &Window) {
        let weak = window.downgrade();
        let id = window.add_event_listener(POPSTATE_EVENT, move |event| {
            let WindowEvent::PopState { state } = event.payload() else {
                return;
            };
            if state.as_deref() == Some(IGNORE_POPSTATE_STATE) {
                return;
            }
            if let Some(window) = weak.upgrade() {
                window.dispatch(WindowEvent::Go(window.location()));
            }
        });
        if let Some(previous) = self.listener.lock().replace(id) {
            window.remove_event_listener(previous);
        }
    }

    fn inactivate(&self, window: &Window) {
        if let Some(id) = self.listener.lock().take() {
            window.remove_event_listener(id);
        }
    }
}
