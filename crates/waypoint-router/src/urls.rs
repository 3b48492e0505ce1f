//! Reverse routing by route name.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{Result, RouterError};
use crate::route::{Children, Route};
use crate::tree::RouteTree;

/// Prefixes `path` with `parent`, keeping one `/` between them.
fn prefix_path(parent: &str, path: &str) -> String {
    let head = parent.strip_suffix('/').unwrap_or(parent);
    let tail = path.strip_prefix('/').unwrap_or(path);
    format!("{head}/{tail}")
}

/// Full templates of every named route.
///
/// A route is reachable by its `name`, or by its `component` when it has
/// no name. The first alternative of each path is used.
#[derive(Debug, Default)]
pub(crate) struct UrlGenerator {
    by_name: HashMap<String, Vec<(Arc<Route>, String)>>,
}

impl UrlGenerator {
    /// Indexes every route currently in `tree`, including dynamic children
    /// produced so far.
    pub(crate) fn new(tree: &RouteTree) -> Self {
        let mut generator = Self::default();
        let mut ancestors = Vec::new();
        for route in tree.top() {
            generator.index(tree, &route, &mut ancestors);
        }
        generator
    }

    fn index(&mut self, tree: &RouteTree, route: &Arc<Route>, ancestors: &mut Vec<String>) {
        if let Some(name) = route.lookup_name() {
            let full_path = ancestors
                .iter()
                .rev()
                .filter(|path| !path.is_empty())
                .fold(route.path.first().to_string(), |full, parent| prefix_path(parent, &full));
            self.by_name
                .entry(name.to_string())
                .or_default()
                .push((Arc::clone(route), full_path));
        }

        if let Some(children) = tree.children_of(route) {
            ancestors.push(route.path.first().to_string());
            for child in &children {
                self.index(tree, child, ancestors);
            }
            ancestors.pop();
        }
    }

    /// Full template of the route called `name`.
    ///
    /// Fails when more than one route carries the name.
    pub(crate) fn template(&self, name: &str) -> Result<Option<&str>> {
        match self.by_name.get(name).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([(_, template)]) => Ok(Some(template)),
            Some(_) => Err(RouterError::DuplicateRouteName(name.to_string())),
        }
    }
}

/// Fails when two routes in `routes` share an explicit name.
pub(crate) fn check_unique_names<'a>(routes: impl IntoIterator<Item = &'a Arc<Route>>) -> Result<()> {
    fn visit<'a>(route: &'a Route, seen: &mut HashSet<&'a str>) -> Result<()> {
        if let Some(name) = route.name.as_deref() {
            if !seen.insert(name) {
                return Err(RouterError::DuplicateRouteName(name.to_string()));
            }
        }
        if let Children::Static(children) = &route.children {
            for child in children {
                visit(child, seen)?;
            }
        }
        Ok(())
    }

    let mut seen = HashSet::new();
    for route in routes {
        visit(route, &mut seen)?;
    }
    Ok(())
}
