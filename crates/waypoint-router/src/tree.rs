//! The route tree and its depth-first matcher.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use waypoint_path::{Key, Params, PatternCache};

use crate::error::Result;
use crate::route::{Children, Route, RouteId};

/// Routes under a synthetic root, plus the side tables filled in while
/// traversing them.
///
/// Route nodes are never mutated: expanded dynamic children and parent
/// links live here, keyed by [`RouteId`], and are dropped with the tree.
#[derive(Debug)]
pub struct RouteTree {
    root: Arc<Route>,
    top: RwLock<Vec<Arc<Route>>>,
    expanded: RwLock<HashMap<RouteId, Vec<Arc<Route>>>>,
    parents: RwLock<HashMap<RouteId, Arc<Route>>>,
}

impl RouteTree {
    /// Wraps `routes` in a synthetic root.
    pub fn new(routes: Vec<Arc<Route>>) -> Self {
        Self {
            root: Arc::new(Route::root()),
            top: RwLock::new(routes),
            expanded: RwLock::new(HashMap::new()),
            parents: RwLock::new(HashMap::new()),
        }
    }

    /// The synthetic root.
    pub fn root(&self) -> &Arc<Route> {
        &self.root
    }

    /// Returns whether `route` is the synthetic root.
    pub fn is_root(&self, route: &Route) -> bool {
        route.id() == self.root.id()
    }

    /// The top-level routes.
    pub fn top(&self) -> Vec<Arc<Route>> {
        self.top.read().clone()
    }

    pub(crate) fn extend_top(&self, routes: impl IntoIterator<Item = Arc<Route>>) {
        self.top.write().extend(routes);
    }

    pub(crate) fn clear_top(&self) {
        self.top.write().clear();
    }

    /// Returns whether `route` has, or may produce, children.
    pub fn has_children(&self, route: &Route) -> bool {
        self.is_root(route) || route.children.is_some()
    }

    /// Current children of `route`.
    ///
    /// Dynamic children that were not produced yet count as empty.
    pub fn children_of(&self, route: &Route) -> Option<Vec<Arc<Route>>> {
        if self.is_root(route) {
            return Some(self.top());
        }
        match &route.children {
            Children::None => None,
            Children::Static(children) => Some(children.clone()),
            Children::Dynamic(_) => Some(
                self.expanded
                    .read()
                    .get(&route.id())
                    .cloned()
                    .unwrap_or_default(),
            ),
        }
    }

    /// Returns whether the dynamic children of `route` were produced.
    pub fn is_expanded(&self, route: &Route) -> bool {
        self.expanded.read().contains_key(&route.id())
    }

    pub(crate) fn set_children(&self, route: &Route, children: Vec<Arc<Route>>) {
        self.expanded.write().insert(route.id(), children);
    }

    pub(crate) fn set_parent(&self, child: &Route, parent: &Arc<Route>) {
        self.parents.write().insert(child.id(), Arc::clone(parent));
    }

    /// The route `route` was last reached from; `None` for the root and for
    /// routes not traversed yet.
    pub fn parent_of(&self, route: &Route) -> Option<Arc<Route>> {
        self.parents.read().get(&route.id()).cloned()
    }

    /// Returns whether `child` lies below `parent`.
    pub fn is_child_route(&self, parent: &Route, child: &Route) -> bool {
        let mut current = self.parent_of(child);
        while let Some(route) = current {
            if route.id() == parent.id() {
                return true;
            }
            current = self.parent_of(&route);
        }
        false
    }
}

/// One step of a depth-first match.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route.
    pub route: Arc<Route>,
    /// Keys of every route from the root down to this one.
    pub keys: Vec<Key>,
    /// Params accumulated from the root down to this one.
    pub params: Params,
    /// The part of the remaining pathname this route consumed.
    pub path: String,
}

/// A restartable depth-first walk over a route subtree.
///
/// Each call to [`next`](RouteMatcher::next) yields the next route whose
/// path matches the unconsumed rest of the pathname: first the node
/// itself, then the matches of its children in order. A route without
/// children must match the whole rest; routes with children match a
/// prefix.
pub struct RouteMatcher {
    tree: Arc<RouteTree>,
    patterns: Arc<PatternCache>,
    route: Arc<Route>,
    pathname: String,
    templates: Vec<String>,
    ignore_leading_slash: bool,
    parent_keys: Vec<Key>,
    parent_params: Params,
    matched: Option<RouteMatch>,
    child_index: usize,
    child: Option<Box<RouteMatcher>>,
}

impl RouteMatcher {
    /// Starts a walk at `route`.
    ///
    /// With `ignore_leading_slash`, a leading `/` of the route's templates
    /// is dropped; it is set below any route whose template starts with
    /// one.
    pub fn new(
        tree: Arc<RouteTree>,
        patterns: Arc<PatternCache>,
        route: Arc<Route>,
        pathname: &str,
        ignore_leading_slash: bool,
    ) -> Self {
        Self::with_parent(
            tree,
            patterns,
            route,
            pathname,
            ignore_leading_slash,
            Vec::new(),
            Params::new(),
        )
    }

    fn with_parent(
        tree: Arc<RouteTree>,
        patterns: Arc<PatternCache>,
        route: Arc<Route>,
        pathname: &str,
        ignore_leading_slash: bool,
        parent_keys: Vec<Key>,
        parent_params: Params,
    ) -> Self {
        let mut templates = Vec::new();
        let mut ignore_below = ignore_leading_slash;
        for template in route.path.templates() {
            if template.starts_with('/') {
                ignore_below = true;
                if ignore_leading_slash {
                    templates.push(template[1..].to_string());
                    continue;
                }
            }
            templates.push(template);
        }

        Self {
            tree,
            patterns,
            route,
            pathname: pathname.to_string(),
            templates,
            ignore_leading_slash: ignore_below,
            parent_keys,
            parent_params,
            matched: None,
            child_index: 0,
            child: None,
        }
    }

    /// Yields the next match, or `None` when the walk is over.
    ///
    /// Reaching `skip` again ends the walk at that route, which prunes its
    /// subtree.
    pub fn next(&mut self, skip: Option<RouteId>) -> Result<Option<RouteMatch>> {
        if skip == Some(self.route.id()) {
            return Ok(None);
        }

        if self.matched.is_none() {
            let exact = !self.tree.has_children(&self.route);
            let pattern = self.patterns.pattern(&self.templates, exact)?;
            if let Some(found) = pattern.exec(&self.pathname, Some(&self.parent_params)) {
                let mut keys = self.parent_keys.clone();
                keys.extend(pattern.keys().iter().cloned());
                let route_match = RouteMatch {
                    route: Arc::clone(&self.route),
                    keys,
                    params: found.params,
                    path: found.path,
                };
                self.matched = Some(route_match.clone());
                return Ok(Some(route_match));
            }
        }

        let Some(matched) = &self.matched else {
            return Ok(None);
        };
        let Some(children) = self.tree.children_of(&self.route) else {
            return Ok(None);
        };

        while self.child_index < children.len() {
            if self.child.is_none() {
                let child_route = Arc::clone(&children[self.child_index]);
                self.tree.set_parent(&child_route, &self.route);

                let mut consumed = matched.path.len();
                if consumed > 0 && self.pathname[consumed..].starts_with('/') {
                    consumed += 1;
                }
                self.child = Some(Box::new(Self::with_parent(
                    Arc::clone(&self.tree),
                    Arc::clone(&self.patterns),
                    child_route,
                    &self.pathname[consumed..],
                    self.ignore_leading_slash,
                    matched.keys.clone(),
                    matched.params.clone(),
                )));
            }

            if let Some(child) = self.child.as_mut() {
                if let Some(found) = child.next(skip)? {
                    return Ok(Some(found));
                }
            }
            self.child = None;
            self.child_index += 1;
        }

        Ok(None)
    }
}

impl std::fmt::Debug for RouteMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatcher")
            .field("route", &self.route.path)
            .field("pathname", &self.pathname)
            .field("child_index", &self.child_index)
            .finish_non_exhaustive()
    }
}
