//! Route definitions.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::action::{ActionContext, ActionResult, Commands};
use crate::error::{Result, RouterError};

/// A boxed future for async hooks and actions.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed async route action.
pub type ActionFn =
    Arc<dyn Fn(ActionContext, Commands) -> BoxFuture<'static, Result<ActionResult>> + Send + Sync>;

/// A boxed async producer of child routes.
pub type ChildrenFn =
    Arc<dyn Fn(ActionContext) -> BoxFuture<'static, Result<Vec<Route>>> + Send + Sync>;

static NEXT_ROUTE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a route node, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(u64);

impl RouteId {
    fn next() -> Self {
        Self(NEXT_ROUTE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A route's path template, or a list of alternative templates.
///
/// The first alternative is used when building URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoutePath {
    /// A single template.
    Single(String),
    /// Alternative templates.
    Alternatives(Vec<String>),
}

impl RoutePath {
    /// Every template, in order.
    pub fn templates(&self) -> Vec<String> {
        match self {
            Self::Single(path) => vec![path.clone()],
            Self::Alternatives(paths) => paths.clone(),
        }
    }

    /// The template used for reverse URL building.
    pub fn first(&self) -> &str {
        match self {
            Self::Single(path) => path,
            Self::Alternatives(paths) => paths.first().map_or("", String::as_str),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Alternatives(paths) if paths.is_empty())
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(path) => f.write_str(path),
            Self::Alternatives(paths) => write!(f, "[{}]", paths.join(", ")),
        }
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        Self::Single(path.to_string())
    }
}

impl From<String> for RoutePath {
    fn from(path: String) -> Self {
        Self::Single(path)
    }
}

impl From<Vec<&str>> for RoutePath {
    fn from(paths: Vec<&str>) -> Self {
        Self::Alternatives(paths.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for RoutePath {
    fn from(paths: Vec<String>) -> Self {
        Self::Alternatives(paths)
    }
}

/// Script bundle loaded before a route's component is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bundle {
    /// A classic script.
    Script(String),
    /// An ES module with an optional fallback for hosts without module
    /// support.
    Modules {
        /// Loaded as `type="module"`.
        #[serde(default)]
        module: Option<String>,
        /// Loaded with `nomodule`.
        #[serde(default)]
        nomodule: Option<String>,
    },
}

/// Enter/leave animation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Animate {
    /// `true` uses the default `entering` / `leaving` classes.
    Enabled(bool),
    /// Custom class names.
    Classes {
        /// Class toggled on entering content.
        #[serde(default)]
        enter: Option<String>,
        /// Class toggled on leaving content.
        #[serde(default)]
        leave: Option<String>,
    },
}

impl Animate {
    /// Returns whether an animation should run.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Enabled(false))
    }

    /// Class for entering content.
    pub fn enter_class(&self) -> &str {
        match self {
            Self::Classes {
                enter: Some(class), ..
            } => class,
            _ => "entering",
        }
    }

    /// Class for leaving content.
    pub fn leave_class(&self) -> &str {
        match self {
            Self::Classes {
                leave: Some(class), ..
            } => class,
            _ => "leaving",
        }
    }
}

/// Children of a route.
#[derive(Clone, Default)]
pub enum Children {
    /// Leaf route.
    #[default]
    None,
    /// Children known up front.
    Static(Vec<Arc<Route>>),
    /// Children produced on first traversal, then memoized.
    Dynamic(ChildrenFn),
}

impl Children {
    /// Returns whether the route has, or may produce, children.
    pub fn is_some(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Static(routes) => f.debug_tuple("Static").field(routes).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// A single route definition.
#[derive(Clone)]
pub struct Route {
    id: RouteId,
    /// Path template(s).
    pub path: RoutePath,
    /// Optional route name for reverse URL lookup.
    pub name: Option<String>,
    /// Tag name of the view to create.
    pub component: Option<String>,
    /// Redirect target template.
    pub redirect: Option<String>,
    /// Script bundle to load.
    pub bundle: Option<Bundle>,
    /// Custom resolution step.
    pub action: Option<ActionFn>,
    /// Nested routes.
    pub children: Children,
    /// Transition animation.
    pub animate: Option<Animate>,
}

impl Route {
    /// Creates a route for `path` with nothing attached yet.
    pub fn new(path: impl Into<RoutePath>) -> Self {
        Self {
            id: RouteId::next(),
            path: path.into(),
            name: None,
            component: None,
            redirect: None,
            bundle: None,
            action: None,
            children: Children::None,
            animate: None,
        }
    }

    /// Creates a route rendering the view with tag `component`.
    pub fn component(path: impl Into<RoutePath>, component: impl Into<String>) -> Self {
        Self::new(path).with_component(component)
    }

    /// Creates a route redirecting to `target`.
    pub fn redirect(path: impl Into<RoutePath>, target: impl Into<String>) -> Self {
        Self::new(path).with_redirect(target)
    }

    /// The synthetic root wrapping top-level routes.
    pub(crate) fn root() -> Self {
        Self::new("")
    }

    /// Returns the route's identity.
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Sets the route name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the component tag name.
    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Sets the redirect target.
    #[must_use]
    pub fn with_redirect(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    /// Sets the bundle.
    #[must_use]
    pub fn bundle(mut self, bundle: Bundle) -> Self {
        self.bundle = Some(bundle);
        self
    }

    /// Sets the animation.
    #[must_use]
    pub fn animate(mut self, animate: Animate) -> Self {
        self.animate = Some(animate);
        self
    }

    /// Sets an async action.
    #[must_use]
    pub fn action<F, Fut>(mut self, action: F) -> Self
    where
        F: Fn(ActionContext, Commands) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ActionResult>> + Send + 'static,
    {
        self.action = Some(Arc::new(move |ctx, commands| Box::pin(action(ctx, commands))));
        self
    }

    /// Sets static children.
    #[must_use]
    pub fn children(mut self, children: Vec<Route>) -> Self {
        self.children = Children::Static(children.into_iter().map(Arc::new).collect());
        self
    }

    /// Sets children produced on first traversal.
    #[must_use]
    pub fn dynamic_children<F, Fut>(mut self, children: F) -> Self
    where
        F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Route>>> + Send + 'static,
    {
        self.children = Children::Dynamic(Arc::new(move |ctx| Box::pin(children(ctx))));
        self
    }

    /// Checks the route's shape, recursing into static children.
    ///
    /// A route needs a non-empty path list and at least one of `component`,
    /// `redirect`, `bundle`, `action` or `children`.
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(RouterError::InvalidRoute(
                "expected route config to have a non-empty \"path\"".to_string(),
            ));
        }

        if self.action.is_none()
            && !self.children.is_some()
            && self.bundle.is_none()
            && self.component.is_none()
            && self.redirect.is_none()
        {
            return Err(RouterError::InvalidRoute(format!(
                "expected route config \"{}\" to include either \"component\", \"redirect\", \
                 \"bundle\" or \"action\" function but none found",
                self.path
            )));
        }

        if let Some(Bundle::Modules {
            module: None,
            nomodule: None,
        }) = &self.bundle
        {
            return Err(RouterError::InvalidRoute(format!(
                "bundle of route \"{}\" names neither a module nor a nomodule script",
                self.path
            )));
        }

        if self.redirect.is_some() {
            for (property, present) in [
                ("bundle", self.bundle.is_some()),
                ("component", self.component.is_some()),
            ] {
                if present {
                    warn!(
                        path = %self.path,
                        "route config has both \"redirect\" and \"{property}\"; \"redirect\" takes precedence"
                    );
                }
            }
        }

        if let Children::Static(children) = &self.children {
            for child in children {
                child.validate()?;
            }
        }

        Ok(())
    }

    /// Name used for reverse lookup: explicit name, else component.
    pub fn lookup_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.component.as_deref())
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Route {}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("component", &self.component)
            .field("redirect", &self.redirect)
            .field("bundle", &self.bundle)
            .field("action", &self.action.as_ref().map(|_| ".."))
            .field("children", &self.children)
            .field("animate", &self.animate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_handler() {
        let err = Route::new("/empty").validate().unwrap_err();
        assert!(matches!(err, RouterError::InvalidRoute(_)));
        assert!(Route::component("/", "x-home").validate().is_ok());
    }

    #[test]
    fn test_validate_recurses() {
        let route = Route::new("/users").children(vec![Route::new(":id")]);
        assert!(route.validate().is_err());
    }

    #[test]
    fn test_validate_bundle_shape() {
        let route = Route::component("/lazy", "x-lazy").bundle(Bundle::Modules {
            module: None,
            nomodule: None,
        });
        assert!(route.validate().is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Route::component("/", "x-a");
        let b = Route::component("/", "x-a");
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_animate_classes() {
        assert_eq!(Animate::Enabled(true).enter_class(), "entering");
        let custom = Animate::Classes {
            enter: Some("fade-in".into()),
            leave: None,
        };
        assert_eq!(custom.enter_class(), "fade-in");
        assert_eq!(custom.leave_class(), "leaving");
        assert!(!Animate::Enabled(false).is_enabled());
    }

    #[test]
    fn test_path_alternatives() {
        let path = RoutePath::from(vec!["/home", "/start"]);
        assert_eq!(path.first(), "/home");
        assert_eq!(path.templates().len(), 2);
    }
}
