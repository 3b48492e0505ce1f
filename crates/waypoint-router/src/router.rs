//! The navigation lifecycle controller.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use futures::future::{self, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};
use waypoint_path::Params;

use crate::action::Redirect;
use crate::bundle::BundleLoader;
use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::generation::{RenderGeneration, RenderTicket};
use crate::location::{join_matched_paths, Location, DEFAULT_DOCUMENT_URL};
use crate::outlet::Outlet;
use crate::resolver::{ChainItem, ErrorHandler, ResolutionContext, Resolver, RouteResult, Step};
use crate::route::{Animate, BoxFuture, Route};
use crate::view::{is_reusable, same_view, view_addr, Element, HookCommands, HookOutcome, ViewFactory, ViewHandle};
use crate::window::{Event, ListenerId, NavigationTarget, Window, WindowEvent, GO_EVENT, IGNORE_POPSTATE_STATE};

/// Maximum number of redirects a single navigation may follow.
pub const MAX_REDIRECT_COUNT: usize = 256;

/// Runs background futures, such as renders requested by window events.
pub type Spawner = Arc<dyn Fn(BoxFuture<'static, ()>) + Send + Sync>;

/// A render in flight.
///
/// Resolves to the committed location, `None` when a newer render
/// superseded it, or the error that made it fail.
pub type RenderFuture = Shared<BoxFuture<'static, Result<Option<Arc<Location>>>>>;

/// Where a fully resolved chain leads.
enum Resolved {
    /// Keep the committed navigation.
    Previous,
    /// Commit this context.
    Next(ResolutionContext),
}

enum Amended {
    Previous,
    Unchanged(ResolutionContext),
    Redirected(ResolutionContext),
}

struct State {
    location: Arc<Location>,
    previous: Option<ResolutionContext>,
    ready: RenderFuture,
    appearing: Option<Vec<ViewHandle>>,
    disappearing: Option<Vec<ViewHandle>>,
    added_by_router: HashMap<usize, ViewHandle>,
    subscription: Option<ListenerId>,
}

struct Inner {
    resolver: Resolver,
    window: Window,
    outlet: RwLock<Option<Arc<dyn Outlet>>>,
    generation: RenderGeneration,
    spawner: Option<Spawner>,
    state: Mutex<State>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(id) = self.state.get_mut().subscription.take() {
            self.window.remove_event_listener(id);
        }
    }
}

fn settled(location: Option<Arc<Location>>) -> RenderFuture {
    let ready: BoxFuture<'static, Result<Option<Arc<Location>>>> = Box::pin(future::ready(Ok(location)));
    ready.shared()
}

/// Builder for [`Router`].
#[derive(Default)]
pub struct RouterBuilder {
    window: Option<Window>,
    outlet: Option<Arc<dyn Outlet>>,
    config: RouterConfig,
    view_factory: Option<Arc<dyn ViewFactory>>,
    bundle_loader: Option<Arc<dyn BundleLoader>>,
    error_handler: Option<ErrorHandler>,
    spawner: Option<Spawner>,
    detached: bool,
}

impl RouterBuilder {
    /// The window to navigate in. Defaults to a window at
    /// `http://localhost/` without triggers.
    #[must_use]
    pub fn window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    /// The subtree views are rendered into.
    #[must_use]
    pub fn outlet(mut self, outlet: Arc<dyn Outlet>) -> Self {
        self.outlet = Some(outlet);
        self
    }

    /// Router-wide settings.
    #[must_use]
    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates views for `component` routes.
    #[must_use]
    pub fn view_factory(mut self, factory: Arc<dyn ViewFactory>) -> Self {
        self.view_factory = Some(factory);
        self
    }

    /// Loads route bundles.
    #[must_use]
    pub fn bundle_loader(mut self, loader: Arc<dyn BundleLoader>) -> Self {
        self.bundle_loader = Some(loader);
        self
    }

    /// Converts resolution errors into results.
    #[must_use]
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(RouterError) -> RouteResult + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Runs renders requested through window events.
    ///
    /// Without a spawner such renders only make progress while
    /// [`Router::ready`] is awaited.
    #[must_use]
    pub fn spawner<F>(mut self, spawner: F) -> Self
    where
        F: Fn(BoxFuture<'static, ()>) + Send + Sync + 'static,
    {
        self.spawner = Some(Arc::new(spawner));
        self
    }

    /// Does not listen for navigation requests until
    /// [`Router::subscribe`] is called.
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// Creates the router.
    pub fn build(self) -> Result<Router> {
        let window = match self.window {
            Some(window) => window,
            None => Window::new(DEFAULT_DOCUMENT_URL)?,
        };

        let mut resolver = Resolver::for_document(&self.config, &window.url())?;
        if let Some(factory) = self.view_factory {
            resolver = resolver.with_view_factory(factory);
        }
        if let Some(loader) = self.bundle_loader {
            resolver = resolver.with_bundle_loader(loader);
        }
        if let Some(handler) = self.error_handler {
            resolver = resolver.with_error_handler(move |error| handler(error));
        }

        let location = Arc::new(Location::unmatched("", "", "", resolver.base()));
        let router = Router {
            inner: Arc::new(Inner {
                resolver,
                window,
                outlet: RwLock::new(self.outlet),
                generation: RenderGeneration::new(),
                spawner: self.spawner,
                state: Mutex::new(State {
                    location,
                    previous: None,
                    ready: settled(None),
                    appearing: None,
                    disappearing: None,
                    added_by_router: HashMap::new(),
                    subscription: None,
                }),
            }),
        };

        if !self.detached {
            router.subscribe();
        }
        Ok(router)
    }
}

/// A client-side router.
///
/// Cheap to clone; clones drive the same navigation state.
#[derive(Clone)]
pub struct Router {
    inner: Arc<Inner>,
}

impl Router {
    /// Starts building a router.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Asks every subscribed router of `window` to navigate to `target`.
    ///
    /// Returns whether a router took the request.
    pub fn go(window: &Window, target: impl Into<NavigationTarget>) -> bool {
        !window.dispatch(WindowEvent::Go(target.into()))
    }

    /// The window the router navigates in.
    pub fn window(&self) -> &Window {
        &self.inner.window
    }

    /// The underlying resolver.
    pub fn resolver(&self) -> &Resolver {
        &self.inner.resolver
    }

    /// The committed location.
    pub fn location(&self) -> Arc<Location> {
        Arc::clone(&self.inner.state.lock().location)
    }

    /// The most recently started render.
    pub fn ready(&self) -> RenderFuture {
        self.inner.state.lock().ready.clone()
    }

    /// The outlet, if set.
    pub fn outlet(&self) -> Option<Arc<dyn Outlet>> {
        self.inner.outlet.read().clone()
    }

    /// Replaces the outlet.
    pub fn set_outlet(&self, outlet: Option<Arc<dyn Outlet>>) {
        *self.inner.outlet.write() = outlet;
    }

    /// The top-level routes.
    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.inner.resolver.routes()
    }

    /// Replaces every route and forgets the committed chain.
    ///
    /// Unless `skip_render` is set, the window's current URL is rendered
    /// again. Invalid routes fail before anything changes. The returned
    /// future resolves when the resulting render completes.
    pub fn set_routes(&self, routes: Vec<Route>, skip_render: bool) -> Result<RenderFuture> {
        self.inner.resolver.set_routes(routes)?;
        self.inner.state.lock().previous = None;
        if !skip_render {
            self.on_navigation_event(self.inner.window.location(), None);
        }
        Ok(self.ready())
    }

    /// Appends top-level routes without rendering; returns all of them.
    pub fn add_routes(&self, routes: Vec<Route>) -> Result<Vec<Arc<Route>>> {
        self.inner.resolver.add_routes(routes)
    }

    /// Builds the URL of the route called `name`.
    pub fn url_for_name(&self, name: &str, params: &Params) -> Result<String> {
        self.inner.resolver.url_for_name(name, params)
    }

    /// Builds a URL from a template.
    pub fn url_for_path(&self, template: &str, params: &Params) -> Result<String> {
        self.inner.resolver.url_for_path(template, params)
    }

    /// Starts listening for navigation requests on the window.
    pub fn subscribe(&self) {
        let mut state = self.inner.state.lock();
        if state.subscription.is_some() {
            return;
        }
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let id = self.inner.window.add_event_listener(GO_EVENT, move |event| {
            let WindowEvent::Go(target) = event.payload() else {
                return;
            };
            if let Some(inner) = weak.upgrade() {
                Router { inner }.on_navigation_event(target.clone(), Some(event));
            }
        });
        state.subscription = Some(id);
    }

    /// Stops listening for navigation requests.
    pub fn unsubscribe(&self) {
        let id = self.inner.state.lock().subscription.take();
        if let Some(id) = id {
            self.inner.window.remove_event_listener(id);
        }
    }

    fn on_navigation_event(&self, target: NavigationTarget, event: Option<&Event>) {
        if self.inner.resolver.base().normalize(&target.pathname).is_none() {
            return;
        }
        if let Some(event) = event {
            event.prevent_default();
        }
        let render = self.render(target, true);
        match &self.inner.spawner {
            Some(spawn) => spawn(Box::pin(render.map(|_| ()))),
            None => debug!("no spawner configured, render proceeds when ready() is awaited"),
        }
    }

    /// Renders `target`, optionally recording it in the window history.
    ///
    /// Starting a render supersedes every render still in flight: only the
    /// latest one touches the outlet or commits a location. The returned
    /// future is also available from [`ready`](Router::ready).
    pub fn render(&self, target: impl Into<NavigationTarget>, update_history: bool) -> RenderFuture {
        let target = target.into();
        let ticket = self.inner.generation.start();
        debug!(href = %target.href(), render_id = ticket.id(), "render started");

        let weak = Arc::downgrade(&self.inner);
        let render: BoxFuture<'static, Result<Option<Arc<Location>>>> = Box::pin(async move {
            let Some(inner) = weak.upgrade() else {
                return Ok(None);
            };
            Router { inner }.run_render(target, ticket, update_history).await
        });
        let render = render.shared();
        self.inner.state.lock().ready = render.clone();
        render
    }

    async fn run_render(
        &self,
        target: NavigationTarget,
        ticket: RenderTicket,
        update_history: bool,
    ) -> Result<Option<Arc<Location>>> {
        let mut context = ResolutionContext::new(target.pathname.clone())
            .search(target.search.clone())
            .hash(target.hash.clone());
        context.ticket = Some(ticket.clone());

        let error = match self.resolve_and_commit(context, &ticket, update_history).await {
            Ok(location) => return Ok(location),
            Err(error) => error,
        };
        if !ticket.is_current() {
            return Ok(None);
        }

        debug!(href = %target.href(), %error, "render failed");
        if update_history {
            self.update_history(&target, false);
        }
        if let Some(outlet) = self.outlet() {
            outlet.clear_children(None);
        }
        let location = Arc::new(Location::unmatched(
            &target.pathname,
            &target.search,
            &target.hash,
            self.inner.resolver.base(),
        ));
        {
            let mut state = self.inner.state.lock();
            state.location = location;
            state.appearing = None;
            state.disappearing = None;
        }
        self.inner.window.dispatch(WindowEvent::Error {
            error: error.clone(),
            target,
        });
        Err(error)
    }

    async fn resolve_and_commit(
        &self,
        context: ResolutionContext,
        ticket: &RenderTicket,
        update_history: bool,
    ) -> Result<Option<Arc<Location>>> {
        let context = self.inner.resolver.resolve_context(context).await?;
        let resolved = self.fully_resolve_chain(context.clone(), context).await?;
        if !ticket.is_current() {
            return Ok(None);
        }

        let mut context = match resolved {
            Resolved::Previous => {
                let (previous, location) = {
                    let state = self.inner.state.lock();
                    (state.previous.clone(), Arc::clone(&state.location))
                };
                if let Some(previous) = previous {
                    let target = NavigationTarget {
                        pathname: previous.pathname,
                        search: previous.search,
                        hash: previous.hash,
                    };
                    self.update_history(&target, true);
                }
                return Ok(Some(location));
            }
            Resolved::Next(context) => context,
        };

        let location = self.location_of(&context, None);
        let previous = {
            let mut state = self.inner.state.lock();
            state.location = Arc::clone(&location);
            state.previous.clone()
        };
        if update_history {
            let target = NavigationTarget {
                pathname: context.pathname.clone(),
                search: context.search.clone(),
                hash: context.hash.clone(),
            };
            self.update_history(&target, ticket.id() == 1);
        }
        self.inner.window.dispatch(WindowEvent::LocationChanged {
            location: Arc::clone(&location),
        });

        if context.skip_attach {
            self.copy_unchanged_elements(&mut context, previous.as_ref());
            self.inner.state.lock().previous = Some(context);
            debug!(pathname = %location.pathname, "navigation committed in place");
            return Ok(Some(location));
        }

        self.add_appearing_content(&mut context, previous.as_ref())?;
        let animation = self.animation_targets(&context);
        let animating = animation.as_ref().map(|(from, to, config)| {
            future::join(from.animate(config.leave_class()), to.animate(config.enter_class()))
        });
        self.run_on_after_enter_callbacks(&context);
        self.run_on_after_leave_callbacks(&context, previous.as_ref());
        if let Some(animating) = animating {
            animating.await;
        }

        if !ticket.is_current() {
            return Ok(None);
        }
        self.remove_disappearing_content();
        self.inner.state.lock().previous = Some(context);
        debug!(pathname = %location.pathname, "navigation committed");
        Ok(Some(location))
    }

    fn location_of(&self, context: &ResolutionContext, route: Option<&Arc<Route>>) -> Arc<Location> {
        Arc::new(Location::from_context(context, route, self.inner.resolver.base()))
    }

    /// Follows redirects and descends until every level of the chain has a
    /// result, then runs the `before` hooks.
    fn fully_resolve_chain(
        &self,
        top: ResolutionContext,
        before: ResolutionContext,
    ) -> BoxFuture<'_, Result<Resolved>> {
        Box::pin(async move {
            let (after, redirected) = self.find_component_after_redirects(before).await?;
            let top = if redirected { after.clone() } else { top };
            if after.handled {
                return self.amend_with_on_before_callbacks(after).await;
            }

            let matched = join_matched_paths(after.chain.iter().map(|item| item.path.as_str()));
            let is_found = self.inner.resolver.base().path_for_router(&matched) == after.pathname;

            let tree = self.inner.resolver.tree();
            let mut parent = after.route.clone();
            let next = loop {
                match self.inner.resolver.next(&after, false, parent.clone()).await? {
                    Step::Found(next) => break Some(next),
                    Step::NotFound if is_found => break None,
                    Step::NotFound => match parent.as_ref().and_then(|route| tree.parent_of(route)) {
                        Some(grandparent) => parent = Some(grandparent),
                        None => {
                            return Err(RouterError::NotFound {
                                pathname: top.pathname.clone(),
                            })
                        }
                    },
                }
            };

            match next {
                Some(next) => self.fully_resolve_chain(top, next).await,
                None => self.amend_with_on_before_callbacks(after).await,
            }
        })
    }

    async fn find_component_after_redirects(
        &self,
        mut context: ResolutionContext,
    ) -> Result<(ResolutionContext, bool)> {
        let mut redirected = false;
        loop {
            match context.result.clone() {
                Some(RouteResult::Element(element)) => {
                    self.render_element(&mut context, element);
                    return Ok((context, redirected));
                }
                Some(RouteResult::Redirect(redirect)) => {
                    context = self
                        .redirect(&redirect, context.redirect_count, context.ticket.clone())
                        .await?;
                    redirected = true;
                }
                Some(RouteResult::Error(error)) => return Err(error),
                None => {
                    return Err(RouterError::InvalidResult {
                        pathname: context.pathname.clone(),
                    })
                }
            }
        }
    }

    fn render_element(&self, context: &mut ResolutionContext, element: Element) {
        if context.is_current() {
            element.view().set_location(self.location_of(context, None));
        }
        let placed = match context.route.clone() {
            Some(route) => context.set_element(&route, element.clone()),
            None => false,
        };
        if !placed && context.handled {
            let route = Arc::new(Route::component(context.pathname.clone(), element.tag_name()));
            context.route = Some(Arc::clone(&route));
            context.chain = vec![ChainItem {
                path: context.pathname.clone(),
                route,
                element: Some(element),
            }];
        }
    }

    async fn redirect(
        &self,
        redirect: &Redirect,
        count: usize,
        ticket: Option<RenderTicket>,
    ) -> Result<ResolutionContext> {
        if count >= MAX_REDIRECT_COUNT {
            return Err(RouterError::TooManyRedirects {
                from: redirect.from.clone(),
            });
        }
        let pathname = self
            .inner
            .resolver
            .url_for_path(&redirect.pathname, &redirect.params)?;
        debug!(from = %redirect.from, to = %pathname, count = count + 1, "redirecting");

        let mut context = ResolutionContext::new(pathname);
        context.redirect_from = Some(redirect.from.clone());
        context.redirect_count = count + 1;
        context.ticket = ticket;
        self.inner.resolver.resolve_context(context).await
    }

    async fn amend_with_on_before_callbacks(&self, context: ResolutionContext) -> Result<Resolved> {
        match self.run_on_before_callbacks(context).await? {
            Amended::Previous => Ok(Resolved::Previous),
            Amended::Unchanged(context) => Ok(Resolved::Next(context)),
            Amended::Redirected(context) => self.fully_resolve_chain(context.clone(), context).await,
        }
    }

    /// Computes the divergence index and runs `before` hooks on the
    /// elements that leave and enter.
    async fn run_on_before_callbacks(&self, mut context: ResolutionContext) -> Result<Amended> {
        let previous = self.inner.state.lock().previous.clone();
        let previous_chain = previous
            .as_ref()
            .map(|previous| previous.chain.clone())
            .unwrap_or_default();

        context.diverged_chain_index = 0;
        context.skip_attach = false;
        if let Some(previous) = previous.as_ref().filter(|_| !previous_chain.is_empty()) {
            let shared = previous_chain.len().min(context.chain.len());
            let mut index = 0;
            while index < shared {
                let (old, new) = (&previous_chain[index], &context.chain[index]);
                let same_instance = match (&old.element, &new.element) {
                    (Some(a), Some(b)) => a.same_instance(b),
                    (None, None) => true,
                    _ => false,
                };
                if old.route.id() != new.route.id()
                    || (old.path != new.path && !same_instance)
                    || !is_reusable(old.element.as_ref(), new.element.as_ref())
                {
                    break;
                }
                index += 1;
            }
            context.diverged_chain_index = index;
            context.skip_attach = context.chain.len() == previous_chain.len()
                && index == context.chain.len()
                && is_reusable(context.element(), previous.element());

            if context.skip_attach
                && previous.pathname == context.pathname
                && previous.search == context.search
                && previous.hash == context.hash
            {
                debug!(pathname = %context.pathname, "location unchanged");
                return Ok(Amended::Previous);
            }
        }

        let commands = HookCommands::new(context.pathname.clone(), context.params.clone());
        let mut outcome = HookOutcome::Proceed;

        // Leave hooks run deepest first, all of them before any enter hook.
        let leaving = if context.skip_attach {
            &previous_chain[..context.chain.len().min(previous_chain.len())]
        } else {
            &previous_chain[context.diverged_chain_index.min(previous_chain.len())..]
        };
        for old in leaving.iter().rev() {
            outcome = self.run_before_leave(outcome, &context, &commands, old).await;
        }

        if context.skip_attach {
            for (kept, item) in previous_chain.iter().zip(&context.chain) {
                outcome = self
                    .run_before_enter(outcome, &context, &commands, kept.element.as_ref(), &item.route)
                    .await;
            }
        } else {
            for index in 0..context.chain.len() {
                if index < context.diverged_chain_index {
                    let kept = previous_chain.get(index).and_then(|kept| {
                        kept.element.as_ref().map(|element| (element, &kept.route))
                    });
                    if let Some((element, route)) = kept.filter(|_| context.is_current()) {
                        element.view().set_location(self.location_of(&context, Some(route)));
                    }
                } else {
                    let item = context.chain[index].clone();
                    outcome = self
                        .run_before_enter(outcome, &context, &commands, item.element.as_ref(), &item.route)
                        .await;
                }
            }
        }

        match outcome {
            HookOutcome::Proceed => Ok(Amended::Unchanged(context)),
            HookOutcome::Cancel => {
                debug!(pathname = %context.pathname, "navigation cancelled");
                Ok(Amended::Previous)
            }
            HookOutcome::Redirect(redirect) => {
                let redirected = self
                    .redirect(&redirect, context.redirect_count, context.ticket.clone())
                    .await?;
                Ok(Amended::Redirected(redirected))
            }
        }
    }

    async fn run_before_leave(
        &self,
        outcome: HookOutcome,
        context: &ResolutionContext,
        commands: &HookCommands,
        item: &ChainItem,
    ) -> HookOutcome {
        if outcome != HookOutcome::Proceed || !context.is_current() {
            return outcome;
        }
        let Some(element) = &item.element else {
            return outcome;
        };

        let location = self.location_of(context, None);
        match element
            .view()
            .on_before_leave(location, commands.clone(), self.clone())
            .await
        {
            HookOutcome::Redirect(redirect) => {
                warn!(
                    tag = element.tag_name(),
                    to = %redirect.pathname,
                    "redirect returned from on_before_leave is ignored"
                );
                HookOutcome::Proceed
            }
            outcome => outcome,
        }
    }

    async fn run_before_enter(
        &self,
        outcome: HookOutcome,
        context: &ResolutionContext,
        commands: &HookCommands,
        element: Option<&Element>,
        route: &Arc<Route>,
    ) -> HookOutcome {
        let Some(element) = element else {
            return outcome;
        };
        if outcome != HookOutcome::Proceed || !context.is_current() {
            return outcome;
        }
        let location = self.location_of(context, Some(route));
        element.view().set_location(Arc::clone(&location));
        element
            .view()
            .on_before_enter(location, commands.clone(), self.clone())
            .await
    }

    /// Moves the still-attached elements of the common prefix into
    /// `context` and returns the deepest of them; `None` is the outlet.
    fn copy_unchanged_elements(
        &self,
        context: &mut ResolutionContext,
        previous: Option<&ResolutionContext>,
    ) -> Option<ViewHandle> {
        let outlet = self.outlet()?;
        let mut deepest: Option<ViewHandle> = None;
        for index in 0..context.diverged_chain_index {
            let unchanged = previous
                .and_then(|previous| previous.chain.get(index))
                .and_then(|item| item.element.clone());
            let Some(unchanged) = unchanged else {
                continue;
            };
            if !outlet.is_child_of(deepest.as_ref(), unchanged.view()) {
                break;
            }
            deepest = Some(Arc::clone(unchanged.view()));
            context.chain[index].element = Some(unchanged);
        }
        deepest
    }

    fn add_appearing_content(
        &self,
        context: &mut ResolutionContext,
        previous: Option<&ResolutionContext>,
    ) -> Result<()> {
        let outlet = self.outlet().ok_or(RouterError::OutletMissing)?;
        self.remove_appearing_content(outlet.as_ref());
        let deepest = self.copy_unchanged_elements(context, previous);

        let result = context.element().map(|element| Arc::clone(element.view()));
        let disappearing: Vec<ViewHandle> = {
            let state = self.inner.state.lock();
            outlet
                .children(deepest.as_ref())
                .into_iter()
                .filter(|child| state.added_by_router.contains_key(&view_addr(child)))
                .filter(|child| !result.as_ref().is_some_and(|result| same_view(result, child)))
                .collect()
        };

        let mut appearing = Vec::new();
        let mut parent = deepest.clone();
        let mut added = Vec::new();
        for item in &context.chain[context.diverged_chain_index..] {
            let Some(element) = &item.element else {
                continue;
            };
            let view = Arc::clone(element.view());
            outlet.append_child(parent.as_ref(), &view);
            let at_top = match (&parent, &deepest) {
                (Some(parent), Some(deepest)) => same_view(parent, deepest),
                (None, None) => true,
                _ => false,
            };
            if at_top {
                appearing.push(Arc::clone(&view));
            }
            added.push(Arc::clone(&view));
            parent = Some(view);
        }

        let mut state = self.inner.state.lock();
        for view in added {
            state.added_by_router.insert(view_addr(&view), view);
        }
        state.appearing = Some(appearing);
        state.disappearing = Some(disappearing);
        Ok(())
    }

    /// Undoes the attach of an interrupted render.
    fn remove_appearing_content(&self, outlet: &dyn Outlet) {
        let appearing = {
            let mut state = self.inner.state.lock();
            match (state.appearing.take(), state.disappearing.take()) {
                (Some(appearing), Some(_)) => appearing,
                _ => return,
            }
        };

        let mut abandoned = Vec::new();
        let mut pending = appearing.clone();
        while let Some(view) = pending.pop() {
            pending.extend(outlet.children(Some(&view)));
            abandoned.push(view_addr(&view));
        }
        {
            let mut state = self.inner.state.lock();
            for addr in &abandoned {
                state.added_by_router.remove(addr);
            }
        }
        for view in &appearing {
            outlet.remove_child(view);
        }
    }

    fn remove_disappearing_content(&self) {
        let disappearing = {
            let mut state = self.inner.state.lock();
            state.appearing = None;
            let disappearing = state.disappearing.take().unwrap_or_default();
            for view in &disappearing {
                state.added_by_router.remove(&view_addr(view));
            }
            disappearing
        };
        if let Some(outlet) = self.outlet() {
            for view in &disappearing {
                outlet.remove_child(view);
            }
        }
    }

    /// The leaving and entering views and the animation of the deepest
    /// route that declares one.
    fn animation_targets(&self, context: &ResolutionContext) -> Option<(ViewHandle, ViewHandle, Animate)> {
        let config = context
            .chain
            .iter()
            .rev()
            .find_map(|item| item.route.animate.clone().filter(Animate::is_enabled))?;
        let state = self.inner.state.lock();
        let from = state.disappearing.as_ref()?.first()?.clone();
        let to = state.appearing.as_ref()?.first()?.clone();
        Some((from, to, config))
    }

    fn run_on_after_enter_callbacks(&self, context: &ResolutionContext) {
        for item in &context.chain[context.diverged_chain_index..] {
            if !context.is_current() {
                break;
            }
            if let Some(element) = &item.element {
                element
                    .view()
                    .on_after_enter(self.location_of(context, Some(&item.route)), self.clone());
            }
        }
    }

    fn run_on_after_leave_callbacks(&self, context: &ResolutionContext, previous: Option<&ResolutionContext>) {
        let Some(previous) = previous else {
            return;
        };
        let start = context.diverged_chain_index.min(previous.chain.len());
        for item in previous.chain[start..].iter().rev() {
            if !context.is_current() {
                break;
            }
            let Some(element) = &item.element else {
                continue;
            };
            element
                .view()
                .on_after_leave(self.location_of(context, None), self.clone());

            let disappearing = self
                .inner
                .state
                .lock()
                .disappearing
                .as_ref()
                .is_some_and(|views| views.iter().any(|view| same_view(view, element.view())));
            if disappearing {
                if let Some(outlet) = self.outlet() {
                    outlet.clear_children(Some(element.view()));
                }
            }
        }
    }

    fn update_history(&self, target: &NavigationTarget, replace: bool) {
        let window = &self.inner.window;
        if window.location() == *target {
            return;
        }
        let href = target.href();
        let updated = if replace {
            window.replace_state(&href)
        } else {
            window.push_state(&href)
        };
        if let Err(error) = updated {
            warn!(%href, %error, "history update failed");
            return;
        }
        window.dispatch(WindowEvent::PopState {
            state: Some(IGNORE_POPSTATE_STATE.to_string()),
        });
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("location", &self.location().url())
            .field("window", &self.inner.window)
            .field("resolver", &self.inner.resolver)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outlet::MemoryOutlet;

    fn router(routes: Vec<Route>) -> (Router, Arc<MemoryOutlet>) {
        let outlet = Arc::new(MemoryOutlet::new());
        let router = Router::builder()
            .outlet(outlet.clone())
            .detached()
            .build()
            .unwrap();
        let _ = router.set_routes(routes, true).unwrap();
        (router, outlet)
    }

    #[tokio::test]
    async fn test_render_commits_location() {
        let (router, outlet) = router(vec![
            Route::component("/", "x-home"),
            Route::component("/a/:id", "x-page-a"),
        ]);
        let location = router.render("/a/42", false).await.unwrap().unwrap();
        assert_eq!(location.params.get("id"), Some("42"));
        assert_eq!(location.route.as_ref().unwrap().component.as_deref(), Some("x-page-a"));
        assert_eq!(outlet.render_tree(), "x-page-a\n");
        assert!(Arc::ptr_eq(&location, &router.location()));
    }

    #[tokio::test]
    async fn test_first_render_replaces_history() {
        let (router, _) = router(vec![Route::component("/:page", "x-page")]);
        router.render("/one", true).await.unwrap();
        assert_eq!(router.window().history_len(), 1);
        router.render("/two", true).await.unwrap();
        assert_eq!(router.window().history_len(), 2);
        assert_eq!(router.window().location().pathname, "/two");
    }

    #[tokio::test]
    async fn test_missing_outlet_fails() {
        let router = Router::builder().detached().build().unwrap();
        let _ = router.set_routes(vec![Route::component("/", "x-home")], true).unwrap();
        let err = router.render("/", false).await.unwrap_err();
        assert!(matches!(err, RouterError::OutletMissing));
    }

    #[tokio::test]
    async fn test_ready_tracks_latest_render() {
        let (router, _) = router(vec![Route::component("/", "x-home")]);
        assert!(router.ready().await.unwrap().is_none());
        let _ = router.render("/", false);
        let location = router.ready().await.unwrap().unwrap();
        assert_eq!(location.pathname, "/");
    }
}
