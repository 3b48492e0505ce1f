#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use waypoint_router::{
    BoxFuture, HookCommands, HookOutcome, Location, MemoryOutlet, Route, Router, View, ViewHandle,
    ViewRegistry, Window,
};

/// Shared record of lifecycle calls, in order.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// A view that records every lifecycle call and answers `before` hooks
/// with preset outcomes.
pub struct RecordingView {
    tag: String,
    log: Log,
    on_enter: Mutex<HookOutcome>,
    on_leave: Mutex<HookOutcome>,
    location: Mutex<Option<Arc<Location>>>,
}

impl RecordingView {
    pub fn new(tag: &str, log: &Log) -> Arc<Self> {
        Arc::new(Self {
            tag: tag.to_string(),
            log: log.clone(),
            on_enter: Mutex::new(HookOutcome::Proceed),
            on_leave: Mutex::new(HookOutcome::Proceed),
            location: Mutex::new(None),
        })
    }

    pub fn answer_enter(&self, outcome: HookOutcome) {
        *self.on_enter.lock() = outcome;
    }

    pub fn answer_leave(&self, outcome: HookOutcome) {
        *self.on_leave.lock() = outcome;
    }

    pub fn location(&self) -> Option<Arc<Location>> {
        self.location.lock().clone()
    }
}

impl View for RecordingView {
    fn tag_name(&self) -> &str {
        &self.tag
    }

    fn set_location(&self, location: Arc<Location>) {
        *self.location.lock() = Some(location);
    }

    fn on_before_enter(
        &self,
        location: Arc<Location>,
        _commands: HookCommands,
        _router: Router,
    ) -> BoxFuture<'_, HookOutcome> {
        self.log.push(format!("before-enter {} {}", self.tag, location.pathname));
        let outcome = self.on_enter.lock().clone();
        Box::pin(async move { outcome })
    }

    fn on_before_leave(
        &self,
        location: Arc<Location>,
        _commands: HookCommands,
        _router: Router,
    ) -> BoxFuture<'_, HookOutcome> {
        self.log.push(format!("before-leave {} {}", self.tag, location.pathname));
        let outcome = self.on_leave.lock().clone();
        Box::pin(async move { outcome })
    }

    fn on_after_enter(&self, location: Arc<Location>, _router: Router) {
        self.log.push(format!("after-enter {} {}", self.tag, location.pathname));
    }

    fn on_after_leave(&self, location: Arc<Location>, _router: Router) {
        self.log.push(format!("after-leave {} {}", self.tag, location.pathname));
    }

    fn animate(&self, class: &str) -> BoxFuture<'_, ()> {
        self.log.push(format!("animate {} {class}", self.tag));
        Box::pin(async {})
    }
}

/// A registry creating a fresh [`RecordingView`] for each of `tags`.
pub fn registry(log: &Log, tags: &[&str]) -> Arc<ViewRegistry> {
    let registry = ViewRegistry::new();
    for tag in tags {
        let log = log.clone();
        let tag = tag.to_string();
        registry.register(tag.clone(), move || -> ViewHandle { RecordingView::new(&tag, &log) });
    }
    Arc::new(registry)
}

/// A registry handing out the given instances, one per tag.
pub fn singletons(views: &[Arc<RecordingView>]) -> Arc<ViewRegistry> {
    let registry = ViewRegistry::new();
    for view in views {
        let view = Arc::clone(view);
        registry.register(view.tag.clone(), move || -> ViewHandle { view.clone() });
    }
    Arc::new(registry)
}

/// A router over a fresh window and outlet, creating views from `registry`.
pub fn router_with(registry: Arc<ViewRegistry>, routes: Vec<Route>) -> (Router, Arc<MemoryOutlet>) {
    let outlet = Arc::new(MemoryOutlet::new());
    let router = Router::builder()
        .outlet(outlet.clone())
        .view_factory(registry)
        .detached()
        .build()
        .unwrap();
    let _ = router.set_routes(routes, true).unwrap();
    (router, outlet)
}

/// A router over a fresh window and outlet, not listening for events.
pub fn router(routes: Vec<Route>) -> (Router, Arc<MemoryOutlet>) {
    let outlet = Arc::new(MemoryOutlet::new());
    let router = Router::builder()
        .outlet(outlet.clone())
        .detached()
        .build()
        .unwrap();
    let _ = router.set_routes(routes, true).unwrap();
    (router, outlet)
}

/// A router listening on a window with default triggers; renders run on
/// the tokio runtime.
pub fn spawned_router(url: &str, routes: Vec<Route>) -> (Router, Window, Arc<MemoryOutlet>) {
    let window = Window::with_default_triggers(url).unwrap();
    let outlet = Arc::new(MemoryOutlet::new());
    let router = Router::builder()
        .window(window.clone())
        .outlet(outlet.clone())
        .spawner(|future| {
            tokio::spawn(future);
        })
        .build()
        .unwrap();
    let _ = router.set_routes(routes, true).unwrap();
    (router, window, outlet)
}

/// Tags of the views attached directly to the outlet.
pub fn top_tags(outlet: &MemoryOutlet) -> Vec<String> {
    use waypoint_router::Outlet;
    outlet
        .children(None)
        .iter()
        .map(|view| view.tag_name().to_string())
        .collect()
}
