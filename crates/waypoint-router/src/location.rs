//! Location snapshots and base-URL aware path helpers.

use std::sync::Arc;

use url::Url;
use waypoint_path::{PathBuilder, Params};

use crate::error::{Result, RouterError};
use crate::resolver::ResolutionContext;
use crate::route::Route;

/// Document URL assumed when no window supplies one.
pub const DEFAULT_DOCUMENT_URL: &str = "http://localhost/";

/// Joins matched path pieces into one path.
///
/// Empty pieces are skipped; exactly one `/` separates the others.
pub fn join_matched_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> String {
    paths.into_iter().fold(String::new(), |joined, path| {
        if path.is_empty() {
            return joined;
        }
        let head = joined.strip_suffix('/').unwrap_or(&joined);
        let tail = path.strip_prefix('/').unwrap_or(path);
        format!("{head}/{tail}")
    })
}

/// The router's base URL, resolved against the document URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseUrl {
    configured: String,
    effective: Option<Url>,
}

impl BaseUrl {
    /// Resolves `base_url` against `document`.
    ///
    /// Everything after the last `/` of the resolved URL is dropped, so
    /// `/app/index.html` and `/app/` both root the router at `/app/`.
    pub fn new(base_url: Option<&str>, document: &Url) -> Result<Self> {
        let configured = base_url.unwrap_or_default().to_string();
        if configured.is_empty() {
            return Ok(Self::default());
        }

        let resolved = document.join(&configured).map_err(|e| RouterError::InvalidUrl {
            url: configured.clone(),
            message: e.to_string(),
        })?;
        let href = resolved.as_str();
        let trimmed = &href[..href.rfind('/').map_or(href.len(), |i| i + 1)];
        let effective = Url::parse(trimmed).map_err(|e| RouterError::InvalidUrl {
            url: configured.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            configured,
            effective: Some(effective),
        })
    }

    /// The base URL as configured.
    pub fn as_str(&self) -> &str {
        &self.configured
    }

    /// The resolved base, when one is configured.
    pub fn effective(&self) -> Option<&Url> {
        self.effective.as_ref()
    }

    /// Returns the part of `pathname` below the base, or `None` when the
    /// pathname lies outside of it.
    ///
    /// Without a base every pathname is returned unchanged.
    pub fn normalize(&self, pathname: &str) -> Option<String> {
        let Some(base) = &self.effective else {
            return Some(pathname.to_string());
        };
        let normalized = base.join(pathname).ok()?;
        normalized
            .as_str()
            .strip_prefix(base.as_str())
            .map(str::to_string)
    }

    /// Maps a router-relative pathname back to an absolute one.
    pub fn path_for_router(&self, pathname: &str) -> String {
        match &self.effective {
            Some(base) => {
                let relative = pathname.strip_prefix('/').unwrap_or(pathname);
                base.join(relative)
                    .map_or_else(|_| pathname.to_string(), |url| url.path().to_string())
            }
            None => pathname.to_string(),
        }
    }
}

/// An immutable snapshot of where the router is.
#[derive(Debug, Clone)]
pub struct Location {
    /// The configured base URL, or empty.
    pub base_url: String,
    /// Absolute pathname.
    pub pathname: String,
    /// Query string, with its leading `?`.
    pub search: String,
    /// Fragment, with its leading `#`.
    pub hash: String,
    /// Matched routes from root to leaf.
    pub routes: Vec<Arc<Route>>,
    /// The route this snapshot was made for; the deepest one by default.
    pub route: Option<Arc<Route>>,
    /// Params accumulated along the chain.
    pub params: Params,
    /// Pathname of the navigation that redirected here.
    pub redirect_from: Option<String>,
    base: BaseUrl,
}

impl Location {
    /// Snapshot of a resolution context.
    pub(crate) fn from_context(
        context: &ResolutionContext,
        route: Option<&Arc<Route>>,
        base: &BaseUrl,
    ) -> Self {
        let routes: Vec<Arc<Route>> = context.chain.iter().map(|item| Arc::clone(&item.route)).collect();
        let route = route.cloned().or_else(|| routes.last().cloned());
        Self {
            base_url: base.as_str().to_string(),
            pathname: context.pathname.clone(),
            search: context.search.clone(),
            hash: context.hash.clone(),
            routes,
            route,
            params: context.params.clone(),
            redirect_from: context.redirect_from.clone(),
            base: base.clone(),
        }
    }

    /// Location of a pathname nothing was rendered for.
    pub(crate) fn unmatched(pathname: &str, search: &str, hash: &str, base: &BaseUrl) -> Self {
        Self {
            base_url: base.as_str().to_string(),
            pathname: pathname.to_string(),
            search: search.to_string(),
            hash: hash.to_string(),
            routes: Vec::new(),
            route: None,
            params: Params::new(),
            redirect_from: None,
            base: base.clone(),
        }
    }

    /// Builds the URL of this location's routes with `params` laid over
    /// the current ones.
    pub fn get_url(&self, params: &Params) -> Result<String> {
        let template = join_matched_paths(self.routes.iter().map(|route| route.path.first()));
        let builder = PathBuilder::new(&template)?;
        let pathname = builder.build(&self.params.merged(params))?;
        Ok(self.base.path_for_router(&pathname))
    }

    /// Pathname, search and hash concatenated.
    pub fn url(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}
