//! Values exchanged with route actions.

use std::sync::Arc;

use waypoint_path::Params;

use crate::route::Route;
use crate::view::{Element, ViewFactory};

/// A redirect instruction.
///
/// `pathname` is a template filled from `params` before the next
/// resolution starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Target template.
    pub pathname: String,
    /// Pathname of the redirecting navigation.
    pub from: String,
    /// Params of the redirecting navigation.
    pub params: Params,
}

/// What a route action produced.
#[derive(Debug, Clone, Default)]
pub enum ActionResult {
    /// Nothing terminal; fall back to the route's redirect, bundle or
    /// component, then continue into its children.
    #[default]
    Pass,
    /// Render this element.
    Element(Element),
    /// Navigate elsewhere.
    Redirect(Redirect),
    /// Treat the route as unmatched: skip its fallbacks and its children
    /// and fall through to the next sibling.
    NotFound,
}

impl ActionResult {
    /// Returns whether the result ends resolution of the route.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pass)
    }
}

impl From<Element> for ActionResult {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<Redirect> for ActionResult {
    fn from(redirect: Redirect) -> Self {
        Self::Redirect(redirect)
    }
}

/// Read-only view of the resolution in progress, handed to actions and
/// dynamic children.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Pathname being resolved.
    pub pathname: String,
    /// Query string, including the leading `?` when present.
    pub search: String,
    /// Fragment, including the leading `#` when present.
    pub hash: String,
    /// Params accumulated from the root down to this route.
    pub params: Params,
    /// The matched route.
    pub route: Arc<Route>,
    /// The part of the pathname the route matched.
    pub path: String,
    /// Matched routes from the root down to this route.
    pub routes: Vec<Arc<Route>>,
    /// Pathname of the navigation that redirected here.
    pub redirect_from: Option<String>,
}

/// Helpers passed to a route action.
#[derive(Clone)]
pub struct Commands {
    from: String,
    params: Params,
    factory: Arc<dyn ViewFactory>,
}

impl Commands {
    pub(crate) fn new(from: String, params: Params, factory: Arc<dyn ViewFactory>) -> Self {
        Self {
            from,
            params,
            factory,
        }
    }

    /// Redirects to `pathname`, a template filled from the current params.
    pub fn redirect(&self, pathname: impl Into<String>) -> ActionResult {
        ActionResult::Redirect(Redirect {
            pathname: pathname.into(),
            from: self.from.clone(),
            params: self.params.clone(),
        })
    }

    /// Renders a new view with tag `component`.
    pub fn component(&self, component: &str) -> ActionResult {
        ActionResult::Element(self.create(component))
    }

    /// Creates a router-owned element without rendering it.
    ///
    /// Router-owned elements with the same tag are reused across
    /// navigations.
    pub fn create(&self, component: &str) -> Element {
        Element::created(self.factory.create(component))
    }
}

impl std::fmt::Debug for Commands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commands")
            .field("from", &self.from)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
