//! # waypoint-router
//!
//! A client-side navigation router.
//!
//! This crate provides:
//! - Nested route trees with static and lazily produced children
//! - Async route actions, redirects and bundle loading
//! - A render pipeline that reuses unchanged views and discards stale renders
//! - Lifecycle hooks on views (`on_before_enter`, `on_before_leave`, ...)
//! - Reverse routing by route name
//! - A headless window with history, events and click/popstate triggers
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use waypoint_router::{MemoryOutlet, Route, Router, Window};
//!
//! let window = Window::with_default_triggers("http://localhost/")?;
//! let outlet = Arc::new(MemoryOutlet::new());
//! let router = Router::builder()
//!     .window(window.clone())
//!     .outlet(outlet.clone())
//!     .build()?;
//!
//! let _ = router
//!     .set_routes(
//!         vec![
//!             Route::component("/", "x-home"),
//!             Route::component("/users/:id", "x-user").name("user"),
//!             Route::redirect("(.*)", "/"),
//!         ],
//!         true,
//!     )?;
//!
//! let location = router.render("/users/42", true).await?.unwrap();
//! assert_eq!(location.params.get("id"), Some("42"));
//! assert_eq!(outlet.render_tree(), "x-user\n");
//! ```
//!
//! ## Actions
//!
//! ```ignore
//! Route::new("/admin").action(|context, commands| async move {
//!     if context.params.contains("token") {
//!         Ok(commands.component("x-admin"))
//!     } else {
//!         Ok(commands.redirect("/login"))
//!     }
//! })
//! ```
//!
//! ## Navigation Requests
//!
//! Any component can ask subscribed routers to navigate:
//!
//! ```ignore
//! Router::go(&window, "/users/7");
//! router.ready().await?;
//! ```

mod action;
mod bundle;
mod config;
mod error;
mod generation;
mod location;
mod outlet;
mod resolver;
mod route;
mod router;
mod tree;
mod triggers;
mod urls;
mod view;
mod window;

pub use action::{ActionContext, ActionResult, Commands, Redirect};
pub use bundle::{BundleCache, BundleLoader, ScriptKind};
pub use config::{routes_from_json, RouteConfig, RouterConfig};
pub use error::{Result, RouterError};
pub use generation::{RenderGeneration, RenderTicket};
pub use location::{join_matched_paths, BaseUrl, Location, DEFAULT_DOCUMENT_URL};
pub use outlet::{MemoryOutlet, Outlet};
pub use resolver::{ChainItem, ErrorHandler, ResolutionContext, Resolver, RouteResult};
pub use route::{
    ActionFn, Animate, BoxFuture, Bundle, Children, ChildrenFn, Route, RouteId, RoutePath,
};
pub use router::{RenderFuture, Router, RouterBuilder, Spawner, MAX_REDIRECT_COUNT};
pub use tree::{RouteMatch, RouteMatcher, RouteTree};
pub use triggers::{ClickEvent, ClickTrigger, NavigationTrigger, Node, PopStateTrigger};
pub use view::{
    same_view, Element, HookCommands, HookOutcome, PlainView, View, ViewFactory, ViewHandle,
    ViewRegistry,
};
pub use waypoint_path::{ParamValue, Params};
pub use window::{
    Event, Listener, ListenerId, NavigationTarget, WeakWindow, Window, WindowEvent, CLICK_EVENT,
    ERROR_EVENT, GO_EVENT, IGNORE_POPSTATE_STATE, LOCATION_CHANGED_EVENT, POPSTATE_EVENT,
};
