//! The host window: history, current URL, events and navigation triggers.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;
use url::Url;

use crate::error::{Result, RouterError};
use crate::location::Location;
use crate::triggers::{ClickEvent, ClickTrigger, NavigationTrigger, PopStateTrigger};

/// Navigation request, cancelable. Routers prevent it when they handle it.
pub const GO_EVENT: &str = "vaadin-router-go";
/// A render committed a new location.
pub const LOCATION_CHANGED_EVENT: &str = "vaadin-router-location-changed";
/// A render failed.
pub const ERROR_EVENT: &str = "vaadin-router-error";
/// History traversal.
pub const POPSTATE_EVENT: &str = "popstate";
/// A click anywhere in the document.
pub const CLICK_EVENT: &str = "click";
/// State of the popstate the router dispatches after its own history
/// updates; listeners skip it.
pub const IGNORE_POPSTATE_STATE: &str = "vaadin-router-ignore";

/// Pathname, search and hash of a navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationTarget {
    /// Absolute pathname.
    pub pathname: String,
    /// Query string, with its leading `?`, or empty.
    pub search: String,
    /// Fragment, with its leading `#`, or empty.
    pub hash: String,
}

impl NavigationTarget {
    /// Splits `url` (`/path?query#hash`) into its parts.
    pub fn parse(url: &str) -> Self {
        let (rest, hash) = match url.find('#') {
            Some(i) => (&url[..i], &url[i..]),
            None => (url, ""),
        };
        let (pathname, search) = match rest.find('?') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        Self {
            pathname: pathname.to_string(),
            search: search.to_string(),
            hash: hash.to_string(),
        }
    }

    /// Target of `url`.
    pub fn from_url(url: &Url) -> Self {
        Self {
            pathname: url.path().to_string(),
            search: url.query().map(|q| format!("?{q}")).unwrap_or_default(),
            hash: url.fragment().map(|f| format!("#{f}")).unwrap_or_default(),
        }
    }

    /// Pathname, search and hash concatenated.
    pub fn href(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}

impl From<&str> for NavigationTarget {
    fn from(url: &str) -> Self {
        Self::parse(url)
    }
}

/// Payload of a window event.
#[derive(Debug, Clone)]
pub enum WindowEvent {
    /// [`GO_EVENT`].
    Go(NavigationTarget),
    /// [`POPSTATE_EVENT`].
    PopState {
        /// History state; [`IGNORE_POPSTATE_STATE`] for router updates.
        state: Option<String>,
    },
    /// [`LOCATION_CHANGED_EVENT`].
    LocationChanged {
        /// The committed location.
        location: Arc<Location>,
    },
    /// [`ERROR_EVENT`].
    Error {
        /// Why the render failed.
        error: RouterError,
        /// What was being rendered.
        target: NavigationTarget,
    },
    /// [`CLICK_EVENT`].
    Click(ClickEvent),
}

impl WindowEvent {
    /// The event type listeners subscribe to.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Go(_) => GO_EVENT,
            Self::PopState { .. } => POPSTATE_EVENT,
            Self::LocationChanged { .. } => LOCATION_CHANGED_EVENT,
            Self::Error { .. } => ERROR_EVENT,
            Self::Click(_) => CLICK_EVENT,
        }
    }

    fn is_cancelable(&self) -> bool {
        matches!(self, Self::Go(_) | Self::Click(_))
    }
}

/// A dispatched event.
#[derive(Debug)]
pub struct Event {
    payload: WindowEvent,
    default_prevented: AtomicBool,
}

impl Event {
    /// The payload.
    pub fn payload(&self) -> &WindowEvent {
        &self.payload
    }

    /// The event type.
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }

    /// Marks the event as handled. Ignored for non-cancelable events.
    pub fn prevent_default(&self) {
        if self.payload.is_cancelable() {
            self.default_prevented.store(true, Ordering::SeqCst);
        }
    }

    /// Returns whether a listener prevented the default action.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }
}

/// An event listener.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle to remove a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct History {
    entries: Vec<Url>,
    index: usize,
}

impl History {
    fn current(&self) -> &Url {
        &self.entries[self.index]
    }
}

struct WindowInner {
    history: Mutex<History>,
    listeners: Mutex<Vec<(ListenerId, String, Listener)>>,
    next_listener: AtomicU64,
    triggers: Mutex<Vec<Arc<dyn NavigationTrigger>>>,
    scroll: Mutex<(i64, i64)>,
}

/// A browser-like window.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Window {
    inner: Arc<WindowInner>,
}

/// A non-owning reference to a [`Window`].
#[derive(Clone)]
pub struct WeakWindow {
    inner: Weak<WindowInner>,
}

impl WeakWindow {
    /// Returns the window if it is still alive.
    pub fn upgrade(&self) -> Option<Window> {
        self.inner.upgrade().map(|inner| Window { inner })
    }
}

impl Window {
    /// Opens a window at `url`, with no navigation triggers.
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| RouterError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            inner: Arc::new(WindowInner {
                history: Mutex::new(History {
                    entries: vec![url],
                    index: 0,
                }),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(1),
                triggers: Mutex::new(Vec::new()),
                scroll: Mutex::new((0, 0)),
            }),
        })
    }

    /// Opens a window at `url` with click and popstate triggers active.
    pub fn with_default_triggers(url: &str) -> Result<Self> {
        let window = Self::new(url)?;
        window.set_triggers(vec![
            Arc::new(PopStateTrigger::new()),
            Arc::new(ClickTrigger::new()),
        ]);
        Ok(window)
    }

    /// A weak reference, for listeners stored in the window itself.
    pub fn downgrade(&self) -> WeakWindow {
        WeakWindow {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// The current URL.
    pub fn url(&self) -> Url {
        self.inner.history.lock().current().clone()
    }

    /// The current URL as a string.
    pub fn href(&self) -> String {
        self.inner.history.lock().current().to_string()
    }

    /// Pathname, search and hash of the current URL.
    pub fn location(&self) -> NavigationTarget {
        NavigationTarget::from_url(self.inner.history.lock().current())
    }

    /// Origin of the current URL.
    pub fn origin(&self) -> String {
        self.inner.history.lock().current().origin().ascii_serialization()
    }

    /// Resolves `href` against the current URL.
    pub fn resolve(&self, href: &str) -> Result<Url> {
        self.url().join(href).map_err(|e| RouterError::InvalidUrl {
            url: href.to_string(),
            message: e.to_string(),
        })
    }

    /// Adds a history entry for `url`, dropping forward entries.
    pub fn push_state(&self, url: &str) -> Result<()> {
        let url = self.resolve(url)?;
        let mut history = self.inner.history.lock();
        let index = history.index + 1;
        history.entries.truncate(index);
        history.entries.push(url);
        history.index = index;
        Ok(())
    }

    /// Replaces the current history entry with `url`.
    pub fn replace_state(&self, url: &str) -> Result<()> {
        let url = self.resolve(url)?;
        let mut history = self.inner.history.lock();
        let index = history.index;
        history.entries[index] = url;
        Ok(())
    }

    /// Number of history entries.
    pub fn history_len(&self) -> usize {
        self.inner.history.lock().entries.len()
    }

    /// Goes back one entry and dispatches `popstate`. Returns false at the
    /// first entry.
    pub fn back(&self) -> bool {
        self.traverse(-1)
    }

    /// Goes forward one entry and dispatches `popstate`. Returns false at
    /// the last entry.
    pub fn forward(&self) -> bool {
        self.traverse(1)
    }

    fn traverse(&self, delta: isize) -> bool {
        {
            let mut history = self.inner.history.lock();
            let Some(index) = history.index.checked_add_signed(delta) else {
                return false;
            };
            if index >= history.entries.len() {
                return false;
            }
            history.index = index;
        }
        self.dispatch(WindowEvent::PopState { state: None });
        true
    }

    /// Scrolls the document.
    pub fn scroll_to(&self, x: i64, y: i64) {
        *self.inner.scroll.lock() = (x, y);
    }

    /// Current scroll position.
    pub fn scroll_position(&self) -> (i64, i64) {
        *self.inner.scroll.lock()
    }

    /// Adds a listener for `event_type`.
    pub fn add_event_listener<F>(&self, event_type: &str, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .lock()
            .push((id, event_type.to_string(), Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(candidate, _, _)| *candidate != id);
        listeners.len() != before
    }

    /// Dispatches `payload` to its listeners in registration order.
    ///
    /// Returns false when a listener prevented the default action.
    pub fn dispatch(&self, payload: WindowEvent) -> bool {
        let event = Event {
            payload,
            default_prevented: AtomicBool::new(false),
        };
        self.dispatch_event(&event);
        !event.default_prevented()
    }

    /// Dispatches an event the caller keeps.
    pub fn dispatch_event(&self, event: &Event) {
        let event_type = event.event_type();
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .filter(|(_, kind, _)| kind == event_type)
            .map(|(_, _, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// Replaces the navigation triggers: the old ones are inactivated, the
    /// new ones activated.
    pub fn set_triggers(&self, triggers: Vec<Arc<dyn NavigationTrigger>>) {
        let old = std::mem::replace(&mut *self.inner.triggers.lock(), triggers.clone());
        for trigger in old {
            trigger.inactivate(self);
        }
        for trigger in &triggers {
            trigger.activate(self);
        }
        debug!(count = triggers.len(), "navigation triggers replaced");
    }

    /// Number of active navigation triggers.
    pub fn trigger_count(&self) -> usize {
        self.inner.triggers.lock().len()
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("href", &self.href())
            .field("history_len", &self.history_len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_parse_target() {
        let target = NavigationTarget::parse("/a/b?x=1#top");
        assert_eq!(target.pathname, "/a/b");
        assert_eq!(target.search, "?x=1");
        assert_eq!(target.hash, "#top");
        assert_eq!(target.href(), "/a/b?x=1#top");
        assert_eq!(NavigationTarget::parse("/only").search, "");
    }

    #[test]
    fn test_history() {
        let window = Window::new("http://localhost/").unwrap();
        window.push_state("/a").unwrap();
        window.push_state("/b?q=1").unwrap();
        assert_eq!(window.location().href(), "/b?q=1");

        assert!(window.back());
        assert_eq!(window.location().pathname, "/a");
        window.replace_state("/c").unwrap();
        assert_eq!(window.history_len(), 3);
        window.push_state("/d").unwrap();
        assert_eq!(window.history_len(), 3);
        assert!(!window.forward());
    }

    #[test]
    fn test_dispatch_and_prevent() {
        let window = Window::new("http://localhost/").unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let id = window.add_event_listener(GO_EVENT, move |event| {
            counter.fetch_add(1, Ordering::SeqCst);
            event.prevent_default();
        });

        assert!(!window.dispatch(WindowEvent::Go("/x".into())));
        assert!(window.dispatch(WindowEvent::PopState { state: None }));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        assert!(window.remove_event_listener(id));
        assert!(window.dispatch(WindowEvent::Go("/x".into())));
    }

    #[test]
    fn test_origin() {
        let window = Window::new("https://example.com:8443/app").unwrap();
        assert_eq!(window.origin(), "https://example.com:8443");
    }
}
