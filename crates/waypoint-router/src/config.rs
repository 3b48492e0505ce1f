//! Router configuration and declarative route tables.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::route::{Animate, Bundle, Route, RoutePath};

/// Router-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Base URL the routes are relative to, e.g. `/app/`.
    pub base_url: Option<String>,
}

impl RouterConfig {
    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// A route as written in a JSON route table.
///
/// Actions and dynamic children cannot be expressed declaratively; attach
/// them to the converted [`Route`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Path template or alternatives.
    pub path: RoutePath,
    /// Name for reverse lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Component tag name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Redirect target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Script bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<Bundle>,
    /// Transition animation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animate: Option<Animate>,
    /// Nested routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RouteConfig>>,
}

impl From<RouteConfig> for Route {
    fn from(config: RouteConfig) -> Self {
        let mut route = Route::new(config.path);
        route.name = config.name;
        route.component = config.component;
        route.redirect = config.redirect;
        route.bundle = config.bundle;
        route.animate = config.animate;
        if let Some(children) = config.children {
            route = route.children(children.into_iter().map(Route::from).collect());
        }
        route
    }
}

/// Parses a JSON route table and validates every route.
pub fn routes_from_json(json: &str) -> Result<Vec<Route>> {
    let configs: Vec<RouteConfig> = serde_json::from_str(json)?;
    let routes: Vec<Route> = configs.into_iter().map(Route::from).collect();
    for route in &routes {
        route.validate()?;
    }
    Ok(routes)
}
