//! Turning a pathname into a resolved route chain.
//!
//! Resolution walks the route tree depth first. Every matched route gets a
//! chance to produce a result: its action runs first, then its `redirect`,
//! `bundle` and `component` properties are consulted in that order. Routes
//! without a terminal result let the walk continue into their children. The
//! first terminal result ends the walk; [`ResolutionContext`] keeps the
//! cursor so callers can ask for further matches later.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;
use url::Url;
use waypoint_path::{Key, Params, PatternCache};

use crate::action::{ActionContext, ActionResult, Commands, Redirect};
use crate::bundle::{BundleCache, BundleLoader};
use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::generation::RenderTicket;
use crate::location::{BaseUrl, DEFAULT_DOCUMENT_URL};
use crate::route::{Children, Route};
use crate::tree::{RouteMatch, RouteMatcher, RouteTree};
use crate::urls::{check_unique_names, UrlGenerator};
use crate::view::{Element, ViewFactory, ViewRegistry};

/// Converts a resolution error into a result.
pub type ErrorHandler = Arc<dyn Fn(RouterError) -> RouteResult + Send + Sync>;

/// The outcome attached to a resolved context.
#[derive(Debug, Clone)]
pub enum RouteResult {
    /// Render this element.
    Element(Element),
    /// Resolve the redirect target instead.
    Redirect(Redirect),
    /// Resolution failed.
    Error(RouterError),
}

/// One matched route of a chain.
#[derive(Debug, Clone)]
pub struct ChainItem {
    /// The part of the pathname the route matched.
    pub path: String,
    /// The matched route.
    pub route: Arc<Route>,
    /// The element rendered for the route, once known.
    pub element: Option<Element>,
}

/// What a call to `next` found.
#[derive(Debug)]
pub(crate) enum Step {
    /// A route with a terminal result.
    Found(ResolutionContext),
    /// No further match below the requested parent.
    NotFound,
}

enum Resolution {
    Terminal(RouteResult),
    Continue,
    Skip,
}

/// The in-flight record of one resolution.
#[derive(Clone)]
pub struct ResolutionContext {
    /// Absolute pathname being resolved.
    pub pathname: String,
    /// Query string, with its leading `?`, or empty.
    pub search: String,
    /// Fragment, with its leading `#`, or empty.
    pub hash: String,
    /// Pathname of the navigation that redirected here.
    pub redirect_from: Option<String>,
    /// Params accumulated from the root down to `route`.
    pub params: Params,
    /// The route that produced `result`.
    pub route: Option<Arc<Route>>,
    /// The part of the pathname `route` matched.
    pub path: String,
    /// Keys accumulated from the root down to `route`.
    pub keys: Vec<Key>,
    /// Matched routes from root to leaf, without the synthetic root.
    pub chain: Vec<ChainItem>,
    /// Outcome for `route`.
    pub result: Option<RouteResult>,
    /// Redirects followed so far.
    pub redirect_count: usize,
    /// First chain position that differs from the previous navigation.
    pub diverged_chain_index: usize,
    /// Whether the rendered elements stay in place.
    pub skip_attach: bool,
    pub(crate) ticket: Option<RenderTicket>,
    pub(crate) handled: bool,
    cursor: Option<Arc<Cursor>>,
}

impl ResolutionContext {
    /// A fresh context for `pathname`.
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            search: String::new(),
            hash: String::new(),
            redirect_from: None,
            params: Params::new(),
            route: None,
            path: String::new(),
            keys: Vec::new(),
            chain: Vec::new(),
            result: None,
            redirect_count: 0,
            diverged_chain_index: 0,
            skip_attach: false,
            ticket: None,
            handled: false,
            cursor: None,
        }
    }

    /// Sets the query string.
    #[must_use]
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Sets the fragment.
    #[must_use]
    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    /// The rendered element of the context, when it resolved to one.
    pub fn element(&self) -> Option<&Element> {
        match &self.result {
            Some(RouteResult::Element(element)) => Some(element),
            _ => None,
        }
    }

    /// Id of the render this context belongs to, if any.
    pub fn render_id(&self) -> Option<u64> {
        self.ticket.as_ref().map(RenderTicket::id)
    }

    /// Returns whether no newer render superseded this context.
    pub fn is_current(&self) -> bool {
        self.ticket.as_ref().map_or(true, RenderTicket::is_current)
    }

    /// Places `element` at the chain position of `route`.
    ///
    /// Later contexts of the same resolution see it too.
    pub(crate) fn set_element(&mut self, route: &Route, element: Element) -> bool {
        let Some(index) = self.chain.iter().position(|item| item.route.id() == route.id()) else {
            return false;
        };
        self.chain[index].element = Some(element.clone());
        if let Some(cursor) = &self.cursor {
            let mut state = cursor.state.lock();
            if let Some(item) = state.chain.get_mut(index) {
                if item.route.id() == route.id() {
                    item.element = Some(element);
                }
            }
        }
        true
    }

    pub(crate) fn action_context(&self, route: &Arc<Route>) -> ActionContext {
        ActionContext {
            pathname: self.pathname.clone(),
            search: self.search.clone(),
            hash: self.hash.clone(),
            params: self.params.clone(),
            route: Arc::clone(route),
            path: self.path.clone(),
            routes: self.chain.iter().map(|item| Arc::clone(&item.route)).collect(),
            redirect_from: self.redirect_from.clone(),
        }
    }

    /// A copy carrying only the request, for starting a new resolution.
    fn request(&self) -> Self {
        Self {
            pathname: self.pathname.clone(),
            search: self.search.clone(),
            hash: self.hash.clone(),
            redirect_from: self.redirect_from.clone(),
            redirect_count: self.redirect_count,
            ticket: self.ticket.clone(),
            ..Self::new(String::new())
        }
    }
}

impl fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("pathname", &self.pathname)
            .field("search", &self.search)
            .field("hash", &self.hash)
            .field("route", &self.route.as_ref().map(|route| route.path.to_string()))
            .field("params", &self.params)
            .field("chain", &self.chain.iter().map(|item| item.path.as_str()).collect::<Vec<_>>())
            .field("result", &self.result)
            .field("redirect_count", &self.redirect_count)
            .field("render_id", &self.render_id())
            .finish_non_exhaustive()
    }
}

/// Match state shared by every context of one resolution.
struct Cursor {
    request: ResolutionContext,
    state: Mutex<CursorState>,
}

struct CursorState {
    matcher: RouteMatcher,
    pending: Option<Option<RouteMatch>>,
    current: Option<RouteMatch>,
    chain: Vec<ChainItem>,
}

impl Cursor {
    /// The context of the current match.
    fn snapshot(&self, state: &CursorState, cursor: &Arc<Cursor>) -> ResolutionContext {
        let mut context = self.request.clone();
        context.chain = state.chain.clone();
        if let Some(current) = &state.current {
            context.route = Some(Arc::clone(&current.route));
            context.params = current.params.clone();
            context.keys = current.keys.clone();
            context.path = current.path.clone();
        }
        context.cursor = Some(Arc::clone(cursor));
        context
    }
}

/// Drops chain entries that are not ancestors of the match, then appends it.
fn update_chain(tree: &RouteTree, chain: &mut Vec<ChainItem>, found: &RouteMatch) {
    if tree.is_root(&found.route) {
        return;
    }
    if let Some(parent) = tree.parent_of(&found.route) {
        while chain.last().is_some_and(|item| item.route.id() != parent.id()) {
            chain.pop();
        }
    }
    chain.push(ChainItem {
        path: found.path.clone(),
        route: Arc::clone(&found.route),
        element: None,
    });
}

/// Resolves pathnames against a route tree.
pub struct Resolver {
    tree: RwLock<Arc<RouteTree>>,
    patterns: Arc<PatternCache>,
    base: BaseUrl,
    factory: Arc<dyn ViewFactory>,
    bundles: BundleCache,
    error_handler: Option<ErrorHandler>,
    urls: Mutex<Option<UrlGenerator>>,
}

impl Resolver {
    /// Creates a resolver without routes, rooted at the default document URL.
    pub fn new(config: &RouterConfig) -> Result<Self> {
        let document = Url::parse(DEFAULT_DOCUMENT_URL).map_err(|e| RouterError::InvalidUrl {
            url: DEFAULT_DOCUMENT_URL.to_string(),
            message: e.to_string(),
        })?;
        Self::for_document(config, &document)
    }

    /// Creates a resolver without routes for a document at `document`.
    pub fn for_document(config: &RouterConfig, document: &Url) -> Result<Self> {
        Ok(Self {
            tree: RwLock::new(Arc::new(RouteTree::new(Vec::new()))),
            patterns: Arc::new(PatternCache::new()),
            base: BaseUrl::new(config.base_url.as_deref(), document)?,
            factory: Arc::new(ViewRegistry::new()),
            bundles: BundleCache::new(None),
            error_handler: None,
            urls: Mutex::new(None),
        })
    }

    /// Sets the factory views are created with.
    #[must_use]
    pub fn with_view_factory(mut self, factory: Arc<dyn ViewFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Sets the loader for route bundles.
    #[must_use]
    pub fn with_bundle_loader(mut self, loader: Arc<dyn BundleLoader>) -> Self {
        self.bundles = BundleCache::new(Some(loader));
        self
    }

    /// Converts resolution errors into results instead of failing.
    #[must_use]
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(RouterError) -> RouteResult + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// The base URL.
    pub fn base(&self) -> &BaseUrl {
        &self.base
    }

    /// The view factory.
    pub fn view_factory(&self) -> &Arc<dyn ViewFactory> {
        &self.factory
    }

    pub(crate) fn tree(&self) -> Arc<RouteTree> {
        Arc::clone(&self.tree.read())
    }

    /// Replaces every route. Nothing changes when a route is invalid.
    pub fn set_routes(&self, routes: Vec<Route>) -> Result<()> {
        let routes = Self::checked(routes)?;
        check_unique_names(&routes)?;
        *self.tree.write() = Arc::new(RouteTree::new(routes));
        self.invalidate_urls();
        debug!("routes replaced");
        Ok(())
    }

    /// Appends top-level routes and returns all of them.
    pub fn add_routes(&self, routes: Vec<Route>) -> Result<Vec<Arc<Route>>> {
        let routes = Self::checked(routes)?;
        let tree = self.tree();
        check_unique_names(tree.top().iter().chain(&routes))?;
        tree.extend_top(routes);
        self.invalidate_urls();
        Ok(tree.top())
    }

    /// Removes every route.
    pub fn remove_routes(&self) {
        self.tree().clear_top();
        self.invalidate_urls();
    }

    /// The top-level routes.
    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.tree().top()
    }

    fn checked(routes: Vec<Route>) -> Result<Vec<Arc<Route>>> {
        for route in &routes {
            route.validate()?;
        }
        Ok(routes.into_iter().map(Arc::new).collect())
    }

    fn invalidate_urls(&self) {
        *self.urls.lock() = None;
        self.patterns.clear_builders();
    }

    /// Builds a URL from a template, honoring the base URL.
    pub fn url_for_path(&self, template: &str, params: &Params) -> Result<String> {
        let pathname = self.patterns.builder(template)?.build(params)?;
        Ok(self.base.path_for_router(&pathname))
    }

    /// Builds the URL of the route called `name`.
    ///
    /// Routes are found by `name`, or by `component` when unnamed. The
    /// index is rebuilt once on a miss, so dynamic children produced since
    /// the last lookup are found too.
    pub fn url_for_name(&self, name: &str, params: &Params) -> Result<String> {
        let template = {
            let mut urls = self.urls.lock();
            let known = match urls.as_ref() {
                Some(generator) => generator.template(name)?.map(str::to_string),
                None => None,
            };
            match known {
                Some(template) => template,
                None => {
                    let generator = UrlGenerator::new(&self.tree());
                    let template = generator
                        .template(name)?
                        .map(str::to_string)
                        .ok_or_else(|| RouterError::RouteNotFound(name.to_string()))?;
                    *urls = Some(generator);
                    template
                }
            }
        };

        let pathname = self.patterns.builder(&template)?.build(params)?;
        let pathname = if pathname.is_empty() {
            "/".to_string()
        } else {
            pathname
        };
        Ok(self.base.path_for_router(&pathname))
    }

    /// Resolves `pathname` to the first route with a terminal result.
    pub async fn resolve(&self, pathname: &str) -> Result<ResolutionContext> {
        self.resolve_context(ResolutionContext::new(pathname)).await
    }

    /// Resolves a prepared context to the first route with a terminal
    /// result.
    ///
    /// Fails with a not-found error when no route matches, unless an error
    /// handler converts the error.
    pub async fn resolve_context(&self, context: ResolutionContext) -> Result<ResolutionContext> {
        let request = context.request();
        let tree = self.tree();
        let Some(normalized) = self.base.normalize(&request.pathname) else {
            debug!(pathname = %request.pathname, "pathname outside of the base url");
            return self.handle_error(
                RouterError::NotFound {
                    pathname: request.pathname.clone(),
                },
                request,
            );
        };

        let matcher = RouteMatcher::new(
            Arc::clone(&tree),
            Arc::clone(&self.patterns),
            Arc::clone(tree.root()),
            &normalized,
            self.base.effective().is_some(),
        );
        let cursor = Arc::new(Cursor {
            request: request.clone(),
            state: Mutex::new(CursorState {
                matcher,
                pending: None,
                current: None,
                chain: Vec::new(),
            }),
        });
        let mut start = request;
        start.cursor = Some(Arc::clone(&cursor));

        match self.next(&start, true, Some(Arc::clone(tree.root()))).await {
            Ok(Step::Found(context)) => Ok(context),
            Ok(Step::NotFound) => {
                let error = RouterError::NotFound {
                    pathname: start.pathname.clone(),
                };
                let latest = cursor.snapshot(&cursor.state.lock(), &cursor);
                self.handle_error(error, latest)
            }
            Err(error) => {
                let latest = cursor.snapshot(&cursor.state.lock(), &cursor);
                self.handle_error(error, latest)
            }
        }
    }

    fn handle_error(&self, error: RouterError, mut context: ResolutionContext) -> Result<ResolutionContext> {
        debug!(pathname = %context.pathname, %error, "resolution failed");
        match &self.error_handler {
            Some(handler) => {
                context.result = Some(handler(error));
                context.handled = true;
                Ok(context)
            }
            None => Err(error),
        }
    }

    /// Finds the next route with a terminal result.
    ///
    /// Unless `resume` is set, only routes below `parent` count; the first
    /// match outside of it is kept for the next call and
    /// [`Step::NotFound`] is returned. `parent` defaults to the route of the
    /// current match.
    pub(crate) async fn next(
        &self,
        context: &ResolutionContext,
        resume: bool,
        parent: Option<Arc<Route>>,
    ) -> Result<Step> {
        let Some(cursor) = context.cursor.clone() else {
            return Ok(Step::NotFound);
        };
        let tree = self.tree();
        let parent = parent.or_else(|| {
            cursor
                .state
                .lock()
                .current
                .as_ref()
                .map(|current| Arc::clone(&current.route))
        });
        let mut skip = false;

        loop {
            let mut candidate = {
                let mut state = cursor.state.lock();
                let skip_id = if skip {
                    state.current.as_ref().map(|current| current.route.id())
                } else {
                    None
                };
                let found = match state.pending.take() {
                    Some(pending) => pending,
                    None => state.matcher.next(skip_id)?,
                };

                if !resume {
                    let below_parent = match (&found, &parent) {
                        (Some(found), Some(parent)) => tree.is_child_route(parent, &found.route),
                        _ => false,
                    };
                    if !below_parent {
                        state.pending = Some(found);
                        return Ok(Step::NotFound);
                    }
                }

                let Some(found) = found else {
                    return Err(RouterError::NotFound {
                        pathname: cursor.request.pathname.clone(),
                    });
                };
                update_chain(&tree, &mut state.chain, &found);
                state.current = Some(found);
                cursor.snapshot(&state, &cursor)
            };

            match self.resolve_route(&candidate).await? {
                Resolution::Terminal(result) => {
                    candidate.result = Some(result);
                    return Ok(Step::Found(candidate));
                }
                Resolution::Continue => skip = false,
                Resolution::Skip => skip = true,
            }
        }
    }

    /// Determines the result of the route a context matched.
    async fn resolve_route(&self, context: &ResolutionContext) -> Result<Resolution> {
        let Some(route) = context.route.clone() else {
            return Ok(Resolution::Continue);
        };

        if let Children::Dynamic(produce) = &route.children {
            let tree = self.tree();
            if !tree.is_expanded(&route) {
                let children = produce(context.action_context(&route)).await?;
                for child in &children {
                    child.validate()?;
                }
                debug!(path = %route.path, count = children.len(), "dynamic children produced");
                tree.set_children(&route, children.into_iter().map(Arc::new).collect());
            }
        }

        let commands = Commands::new(
            context.pathname.clone(),
            context.params.clone(),
            Arc::clone(&self.factory),
        );

        let result = match &route.action {
            Some(action) if context.is_current() => {
                action(context.action_context(&route), commands.clone()).await?
            }
            _ => ActionResult::Pass,
        };

        match result {
            ActionResult::Element(element) => return Ok(Resolution::Terminal(RouteResult::Element(element))),
            ActionResult::Redirect(redirect) => return Ok(Resolution::Terminal(RouteResult::Redirect(redirect))),
            ActionResult::NotFound => return Ok(Resolution::Skip),
            ActionResult::Pass => {}
        }

        if let Some(target) = &route.redirect {
            if let ActionResult::Redirect(redirect) = commands.redirect(target.as_str()) {
                return Ok(Resolution::Terminal(RouteResult::Redirect(redirect)));
            }
        }

        if let Some(bundle) = &route.bundle {
            self.bundles.load(bundle).await?;
        }

        match &route.component {
            Some(component) => Ok(Resolution::Terminal(RouteResult::Element(
                commands.create(component),
            ))),
            None => Ok(Resolution::Continue),
        }
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("base", &self.base)
            .field("routes", &self.routes().len())
            .field("bundles", &self.bundles)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(routes: Vec<Route>) -> Resolver {
        let resolver = Resolver::new(&RouterConfig::default()).unwrap();
        resolver.set_routes(routes).unwrap();
        resolver
    }

    fn tag(context: &ResolutionContext) -> &str {
        context.element().map(Element::tag_name).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_resolves_params() {
        let resolver = resolver(vec![
            Route::component("/", "x-home"),
            Route::component("/a/:id", "x-page-a"),
        ]);
        let context = resolver.resolve("/a/42").await.unwrap();
        assert_eq!(tag(&context), "x-page-a");
        assert_eq!(context.params.get("id"), Some("42"));
        assert_eq!(context.chain.len(), 1);
    }

    #[tokio::test]
    async fn test_not_found() {
        let resolver = resolver(vec![Route::component("/", "x-home")]);
        let err = resolver.resolve("/missing").await.unwrap_err();
        assert_eq!(err.code(), 404);
    }

    #[tokio::test]
    async fn test_redirect_fallback() {
        let resolver = resolver(vec![Route::redirect("/old/:id", "/new/:id")]);
        let context = resolver.resolve("/old/3").await.unwrap();
        let Some(RouteResult::Redirect(redirect)) = context.result else {
            panic!("expected redirect");
        };
        assert_eq!(redirect.pathname, "/new/:id");
        assert_eq!(redirect.from, "/old/3");
        assert_eq!(redirect.params.get("id"), Some("3"));
    }

    #[tokio::test]
    async fn test_parent_without_result_descends() {
        let resolver = resolver(vec![Route::new("/users").children(vec![
            Route::component("/", "x-list"),
            Route::component("/:id", "x-user"),
        ])]);
        let context = resolver.resolve("/users/9").await.unwrap();
        assert_eq!(tag(&context), "x-user");
        let paths: Vec<&str> = context.chain.iter().map(|item| item.path.as_str()).collect();
        assert_eq!(paths, vec!["/users", "9"]);
    }

    #[tokio::test]
    async fn test_action_not_found_falls_through() {
        let resolver = resolver(vec![
            Route::new("/a")
                .action(|_, _| async { Ok(ActionResult::NotFound) })
                .children(vec![Route::component("/b", "x-child")]),
            Route::component("/a/b", "x-sibling"),
        ]);
        let context = resolver.resolve("/a/b").await.unwrap();
        assert_eq!(tag(&context), "x-sibling");
    }

    #[tokio::test]
    async fn test_action_component() {
        let resolver = resolver(vec![Route::new("/x").action(|ctx, commands| async move {
            assert_eq!(ctx.pathname, "/x");
            Ok(commands.component("x-from-action"))
        })]);
        let context = resolver.resolve("/x").await.unwrap();
        assert_eq!(tag(&context), "x-from-action");
        assert!(context.element().unwrap().is_created_by_router());
    }

    #[tokio::test]
    async fn test_action_error_propagates() {
        let resolver = resolver(vec![
            Route::new("/boom").action(|_, _| async { Err(RouterError::action("boom")) })
        ]);
        let err = resolver.resolve("/boom").await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.code(), 500);
    }

    #[tokio::test]
    async fn test_error_handler() {
        let resolver = Resolver::new(&RouterConfig::default())
            .unwrap()
            .with_error_handler(RouteResult::Error);
        resolver.set_routes(vec![Route::component("/", "x-home")]).unwrap();
        let context = resolver.resolve("/nope").await.unwrap();
        assert!(matches!(context.result, Some(RouteResult::Error(ref e)) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_dynamic_children_memoized() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let resolver = resolver(vec![Route::new("/lazy").dynamic_children(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(vec![Route::component("/page", "x-lazy-page")]) }
        })]);

        let context = resolver.resolve("/lazy/page").await.unwrap();
        assert_eq!(tag(&context), "x-lazy-page");
        resolver.resolve("/lazy/page").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dynamic_children_validated() {
        let resolver = resolver(vec![
            Route::new("/lazy").dynamic_children(|_| async { Ok(vec![Route::new("/broken")]) })
        ]);
        let err = resolver.resolve("/lazy/broken").await.unwrap_err();
        assert!(matches!(err, RouterError::InvalidRoute(_)));
    }

    #[tokio::test]
    async fn test_base_url() {
        let config = RouterConfig::default().base_url("/app/");
        let resolver = Resolver::new(&config).unwrap();
        resolver
            .set_routes(vec![Route::component("/users/:id", "x-user").name("user")])
            .unwrap();

        let context = resolver.resolve("/app/users/5").await.unwrap();
        assert_eq!(context.params.get("id"), Some("5"));
        assert!(resolver.resolve("/users/5").await.is_err());

        let params: Params = [("id", "5")].into_iter().collect();
        assert_eq!(resolver.url_for_name("user", &params).unwrap(), "/app/users/5");
        assert_eq!(resolver.url_for_path("/x/:id", &params).unwrap(), "/app/x/5");
    }

    #[tokio::test]
    async fn test_next_continues_below_parent() {
        let resolver = resolver(vec![Route::component("/users", "x-users")
            .children(vec![Route::component("/:id", "x-user")])]);
        let context = resolver.resolve("/users/1").await.unwrap();
        assert_eq!(tag(&context), "x-users");

        let Step::Found(child) = resolver.next(&context, false, None).await.unwrap() else {
            panic!("expected a child match");
        };
        assert_eq!(tag(&child), "x-user");
        assert_eq!(child.chain.len(), 2);
        assert!(matches!(resolver.next(&child, false, None).await.unwrap(), Step::NotFound));
    }

    #[test]
    fn test_configuration_errors() {
        let resolver = resolver(vec![Route::component("/", "x-home")]);
        assert!(resolver.set_routes(vec![Route::new("/bad")]).is_err());
        assert_eq!(resolver.routes().len(), 1);

        let err = resolver
            .add_routes(vec![
                Route::component("/a", "x-a").name("dup"),
                Route::component("/b", "x-b").name("dup"),
            ])
            .unwrap_err();
        assert!(matches!(err, RouterError::DuplicateRouteName(_)));

        let all = resolver.add_routes(vec![Route::component("/a", "x-a")]).unwrap();
        assert_eq!(all.len(), 2);
        resolver.remove_routes();
        assert!(resolver.routes().is_empty());
    }

    #[test]
    fn test_url_for_name_errors() {
        let resolver = resolver(vec![Route::component("/", "x-home")]);
        assert!(matches!(
            resolver.url_for_name("nope", &Params::new()),
            Err(RouterError::RouteNotFound(_))
        ));
        assert_eq!(resolver.url_for_name("x-home", &Params::new()).unwrap(), "/");
    }
}
