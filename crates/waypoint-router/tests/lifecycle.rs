mod common;

use std::sync::Arc;

use common::{registry, router_with, singletons, top_tags, Log, RecordingView};
use futures::channel::oneshot;
use parking_lot::Mutex;
use waypoint_router::{
    same_view, ActionResult, Animate, Element, HookOutcome, Outlet, Params, Redirect, Route,
    Router, ViewHandle,
};

#[tokio::test]
async fn test_hook_order() {
    let log = Log::default();
    let (router, _) = router_with(
        registry(&log, &["x-a", "x-b"]),
        vec![Route::component("/a", "x-a"), Route::component("/b", "x-b")],
    );

    router.render("/a", false).await.unwrap();
    assert_eq!(log.take(), vec!["before-enter x-a /a", "after-enter x-a /a"]);

    router.render("/b", false).await.unwrap();
    assert_eq!(
        log.take(),
        vec![
            "before-leave x-a /b",
            "before-enter x-b /b",
            "after-enter x-b /b",
            "after-leave x-a /b",
        ]
    );
}

#[tokio::test]
async fn test_view_receives_location() {
    let log = Log::default();
    let user = RecordingView::new("x-user", &log);
    let (router, _) = router_with(
        singletons(&[user.clone()]),
        vec![Route::component("/users/:id", "x-user")],
    );

    router.render("/users/3", false).await.unwrap();
    let location = user.location().unwrap();
    assert_eq!(location.pathname, "/users/3");
    assert_eq!(location.params.get("id"), Some("3"));
}

#[tokio::test]
async fn test_leave_cancel_keeps_previous() {
    let log = Log::default();
    let home = RecordingView::new("x-home", &log);
    let (router, outlet) = router_with(
        singletons(&[home.clone(), RecordingView::new("x-other", &log)]),
        vec![Route::component("/", "x-home"), Route::component("/other", "x-other")],
    );

    let committed = router.render("/", true).await.unwrap().unwrap();
    home.answer_leave(HookOutcome::Cancel);
    log.take();

    let kept = router.render("/other", true).await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&committed, &kept));
    assert_eq!(router.location().pathname, "/");
    assert_eq!(router.window().location().pathname, "/");
    assert_eq!(outlet.render_tree(), "x-home\n");
    assert_eq!(log.take(), vec!["before-leave x-home /other"]);

    home.answer_leave(HookOutcome::Proceed);
    router.render("/other", true).await.unwrap();
    assert_eq!(outlet.render_tree(), "x-other\n");
}

#[tokio::test]
async fn test_enter_cancel_keeps_previous() {
    let log = Log::default();
    let locked = RecordingView::new("x-locked", &log);
    locked.answer_enter(HookOutcome::Cancel);
    let (router, outlet) = router_with(
        singletons(&[locked]),
        vec![Route::component("/", "x-home"), Route::component("/locked", "x-locked")],
    );

    router.render("/", false).await.unwrap();
    let location = router.render("/locked", false).await.unwrap().unwrap();
    assert_eq!(location.pathname, "/");
    assert_eq!(outlet.render_tree(), "x-home\n");
}

#[tokio::test]
async fn test_enter_redirect() {
    let log = Log::default();
    let guard = RecordingView::new("x-guard", &log);
    guard.answer_enter(HookOutcome::Redirect(Redirect {
        pathname: "/login".to_string(),
        from: "/guarded".to_string(),
        params: Params::new(),
    }));
    let (router, outlet) = router_with(
        singletons(&[guard]),
        vec![Route::component("/guarded", "x-guard"), Route::component("/login", "x-login")],
    );

    let location = router.render("/guarded", false).await.unwrap().unwrap();
    assert_eq!(location.pathname, "/login");
    assert_eq!(location.redirect_from.as_deref(), Some("/guarded"));
    assert_eq!(outlet.render_tree(), "x-login\n");
}

#[tokio::test]
async fn test_leave_redirect_is_ignored() {
    let log = Log::default();
    let home = RecordingView::new("x-home", &log);
    home.answer_leave(HookOutcome::Redirect(Redirect {
        pathname: "/elsewhere".to_string(),
        from: "/".to_string(),
        params: Params::new(),
    }));
    let (router, outlet) = router_with(
        singletons(&[home]),
        vec![Route::component("/", "x-home"), Route::component("/next", "x-next")],
    );

    router.render("/", false).await.unwrap();
    let location = router.render("/next", false).await.unwrap().unwrap();
    assert_eq!(location.pathname, "/next");
    assert_eq!(outlet.render_tree(), "x-next\n");
}

#[tokio::test]
async fn test_shared_parent_is_reused() {
    let log = Log::default();
    let (router, outlet) = router_with(
        registry(&log, &["x-users", "x-user"]),
        vec![Route::component("/users", "x-users").children(vec![Route::component("/:id", "x-user")])],
    );

    router.render("/users/1", false).await.unwrap();
    let parent = outlet.children(None)[0].clone();
    let first_child = outlet.children(Some(&parent))[0].clone();
    log.take();

    router.render("/users/2", false).await.unwrap();
    assert!(same_view(&outlet.children(None)[0], &parent));
    let children = outlet.children(Some(&parent));
    assert_eq!(children.len(), 1);
    assert!(!same_view(&children[0], &first_child));
    assert_eq!(outlet.render_tree(), "x-users\n  x-user\n");
    assert_eq!(
        log.take(),
        vec![
            "before-leave x-user /users/2",
            "before-enter x-user /users/2",
            "after-enter x-user /users/2",
            "after-leave x-user /users/2",
        ]
    );
}

#[tokio::test]
async fn test_param_change_replaces_created_view() {
    let log = Log::default();
    let (router, outlet) = router_with(
        registry(&log, &["x-user"]),
        vec![Route::component("/users/:id", "x-user")],
    );

    router.render("/users/1", false).await.unwrap();
    let view = outlet.children(None)[0].clone();

    router.render("/users/2", false).await.unwrap();
    assert_eq!(outlet.len(), 1);
    assert!(!same_view(&outlet.children(None)[0], &view));
}

#[tokio::test]
async fn test_same_instance_stays_attached() {
    let log = Log::default();
    let user = RecordingView::new("x-user", &log);
    let handle: ViewHandle = user.clone();
    let (router, outlet) = router_with(
        registry(&log, &[]),
        vec![Route::new("/users/:id").action(move |_, _| {
            let view = handle.clone();
            async move { Ok(ActionResult::Element(Element::external(view))) }
        })],
    );

    router.render("/users/1", false).await.unwrap();
    log.take();

    let location = router.render("/users/2", false).await.unwrap().unwrap();
    assert_eq!(location.params.get("id"), Some("2"));
    assert_eq!(outlet.len(), 1);
    assert_eq!(user.location().unwrap().pathname, "/users/2");
    assert_eq!(
        log.take(),
        vec!["before-leave x-user /users/2", "before-enter x-user /users/2"]
    );
}

#[tokio::test]
async fn test_animation() {
    let log = Log::default();
    let (router, outlet) = router_with(
        registry(&log, &["x-a", "x-b"]),
        vec![
            Route::component("/a", "x-a").animate(Animate::Enabled(true)),
            Route::component("/b", "x-b").animate(Animate::Classes {
                enter: Some("fade-in".to_string()),
                leave: None,
            }),
        ],
    );

    router.render("/a", false).await.unwrap();
    log.take();
    router.render("/b", false).await.unwrap();

    let entries = log.take();
    assert!(entries.contains(&"animate x-a leaving".to_string()), "{entries:?}");
    assert!(entries.contains(&"animate x-b fade-in".to_string()), "{entries:?}");
    assert_eq!(top_tags(&outlet), vec!["x-b"]);
}

#[tokio::test]
async fn test_no_animation_without_config() {
    let log = Log::default();
    let (router, _) = router_with(
        registry(&log, &["x-a", "x-b"]),
        vec![Route::component("/a", "x-a"), Route::component("/b", "x-b")],
    );
    router.render("/a", false).await.unwrap();
    router.render("/b", false).await.unwrap();
    assert!(!log.entries().iter().any(|entry| entry.starts_with("animate")));
}

#[tokio::test]
async fn test_latest_render_wins() {
    let (entered_tx, entered_rx) = oneshot::channel::<()>();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let entered = Arc::new(Mutex::new(Some(entered_tx)));
    let release = Arc::new(Mutex::new(Some(release_rx)));

    let log = Log::default();
    let (router, outlet) = router_with(
        registry(&log, &["x-x", "x-y"]),
        vec![
            Route::new("/x").action(move |_, commands| {
                let entered = entered.lock().take();
                let release = release.lock().take();
                async move {
                    if let Some(entered) = entered {
                        let _ = entered.send(());
                    }
                    if let Some(release) = release {
                        let _ = release.await;
                    }
                    Ok(commands.component("x-x"))
                }
            }),
            Route::component("/y", "x-y"),
        ],
    );

    let slow = tokio::spawn(router.render("/x", true));
    entered_rx.await.unwrap();

    let location = router.render("/y", true).await.unwrap().unwrap();
    assert_eq!(location.pathname, "/y");
    release_tx.send(()).unwrap();

    assert!(slow.await.unwrap().unwrap().is_none());
    assert_eq!(router.location().pathname, "/y");
    assert_eq!(router.window().location().pathname, "/y");
    assert_eq!(outlet.render_tree(), "x-y\n");
    assert!(!log.entries().iter().any(|entry| entry.contains("x-x")));
}

#[tokio::test]
async fn test_hooks_receive_router() {
    struct Navigator {
        seen: Mutex<Option<Router>>,
    }

    impl waypoint_router::View for Navigator {
        fn tag_name(&self) -> &str {
            "x-nav"
        }

        fn on_after_enter(&self, _location: Arc<waypoint_router::Location>, router: Router) {
            *self.seen.lock() = Some(router);
        }
    }

    let view = Arc::new(Navigator {
        seen: Mutex::new(None),
    });
    let registry = waypoint_router::ViewRegistry::new();
    let handle = view.clone();
    registry.register("x-nav", move || -> waypoint_router::ViewHandle { handle.clone() });
    let (router, _) = router_with(Arc::new(registry), vec![Route::component("/", "x-nav")]);

    router.render("/", false).await.unwrap();
    let seen = view.seen.lock().take().unwrap();
    assert_eq!(seen.location().pathname, "/");
}

fn nested(log: &Log) -> (Arc<RecordingView>, Arc<RecordingView>, Arc<RecordingView>, Vec<Route>) {
    let parent = RecordingView::new("x-p", log);
    let a = RecordingView::new("x-a", log);
    let b = RecordingView::new("x-b", log);
    let routes = vec![Route::component("/p", "x-p").children(vec![
        Route::component("/a", "x-a"),
        Route::component("/b", "x-b"),
    ])];
    (parent, a, b, routes)
}

#[tokio::test]
async fn test_reused_chain_runs_leave_hooks_first() {
    let log = Log::default();
    let (parent, a, b, routes) = nested(&log);
    let (router, outlet) = router_with(singletons(&[parent, a, b]), routes);

    router.render("/p/a", false).await.unwrap();
    log.take();

    let location = router.render("/p/a?tab=2", false).await.unwrap().unwrap();
    assert_eq!(location.search, "?tab=2");
    assert_eq!(outlet.render_tree(), "x-p\n  x-a\n");
    assert_eq!(
        log.take(),
        vec![
            "before-leave x-a /p/a",
            "before-leave x-p /p/a",
            "before-enter x-p /p/a",
            "before-enter x-a /p/a",
        ]
    );
}

#[tokio::test]
async fn test_reused_chain_cancel_skips_enter_hooks() {
    let log = Log::default();
    let (parent, a, b, routes) = nested(&log);
    let (router, outlet) = router_with(singletons(&[parent, a.clone(), b]), routes);

    let committed = router.render("/p/a", false).await.unwrap().unwrap();
    a.answer_leave(HookOutcome::Cancel);
    log.take();

    let kept = router.render("/p/a?tab=2", false).await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&committed, &kept));
    assert_eq!(router.location().search, "");
    assert_eq!(outlet.render_tree(), "x-p\n  x-a\n");
    assert_eq!(log.take(), vec!["before-leave x-a /p/a"]);
}

#[tokio::test]
async fn test_kept_parent_child_leave_cancel() {
    let log = Log::default();
    let (parent, a, b, routes) = nested(&log);
    let (router, outlet) = router_with(singletons(&[parent, a.clone(), b]), routes);

    router.render("/p/a", false).await.unwrap();
    a.answer_leave(HookOutcome::Cancel);
    log.take();

    let kept = router.render("/p/b", false).await.unwrap().unwrap();
    assert_eq!(kept.pathname, "/p/a");
    assert_eq!(outlet.render_tree(), "x-p\n  x-a\n");
    assert_eq!(log.take(), vec!["before-leave x-a /p/b"]);

    a.answer_leave(HookOutcome::Proceed);
    router.render("/p/b", false).await.unwrap();
    assert_eq!(outlet.render_tree(), "x-p\n  x-b\n");
    assert_eq!(
        log.take(),
        vec![
            "before-leave x-a /p/b",
            "before-enter x-b /p/b",
            "after-enter x-b /p/b",
            "after-leave x-a /p/b",
        ]
    );
}

/// A view whose animation blocks until released.
struct GatedView {
    started: Mutex<Option<oneshot::Sender<()>>>,
    release: Mutex<Option<oneshot::Receiver<()>>>,
}

impl waypoint_router::View for GatedView {
    fn tag_name(&self) -> &str {
        "x-slow"
    }

    fn animate(&self, _class: &str) -> waypoint_router::BoxFuture<'_, ()> {
        let started = self.started.lock().take();
        let release = self.release.lock().take();
        Box::pin(async move {
            if let Some(started) = started {
                let _ = started.send(());
            }
            if let Some(release) = release {
                let _ = release.await;
            }
        })
    }
}

#[tokio::test]
async fn test_interrupted_render_releases_its_views() {
    let (started_tx, started_rx) = oneshot::channel::<()>();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let slow = Arc::new(GatedView {
        started: Mutex::new(Some(started_tx)),
        release: Mutex::new(Some(release_rx)),
    });

    let registry = waypoint_router::ViewRegistry::new();
    let handle = slow.clone();
    registry.register("x-slow", move || -> ViewHandle { handle.clone() });
    let (router, outlet) = router_with(
        Arc::new(registry),
        vec![
            Route::component("/", "x-home"),
            Route::component("/slow", "x-slow").animate(Animate::Enabled(true)),
            Route::component("/done", "x-done"),
        ],
    );
    router.render("/", false).await.unwrap();
    let baseline = Arc::strong_count(&slow);

    let interrupted = tokio::spawn(router.render("/slow", false));
    started_rx.await.unwrap();

    router.render("/done", false).await.unwrap();
    release_tx.send(()).unwrap();
    assert!(interrupted.await.unwrap().unwrap().is_none());

    assert_eq!(outlet.render_tree(), "x-done\n");
    assert_eq!(Arc::strong_count(&slow), baseline);
}

#[tokio::test]
async fn test_stale_render_leaves_kept_views_alone() {
    let (entered_tx, entered_rx) = oneshot::channel::<()>();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let entered = Arc::new(Mutex::new(Some(entered_tx)));
    let release = Arc::new(Mutex::new(Some(release_rx)));

    let log = Log::default();
    let parent = RecordingView::new("x-p", &log);
    let (router, outlet) = router_with(
        singletons(&[parent.clone(), RecordingView::new("x-a", &log)]),
        vec![Route::component("/p", "x-p").children(vec![
            Route::component("/a", "x-a"),
            Route::new("/b").action(move |_, commands| {
                let entered = entered.lock().take();
                let release = release.lock().take();
                async move {
                    if let Some(entered) = entered {
                        let _ = entered.send(());
                    }
                    if let Some(release) = release {
                        let _ = release.await;
                    }
                    Ok(commands.component("x-b"))
                }
            }),
        ])],
    );
    router.render("/p/a", false).await.unwrap();

    let stale = tokio::spawn(router.render("/p/b", false));
    entered_rx.await.unwrap();
    router.render("/p/a?v=2", false).await.unwrap();
    release_tx.send(()).unwrap();
    assert!(stale.await.unwrap().unwrap().is_none());

    let location = parent.location().unwrap();
    assert_eq!(location.pathname, "/p/a");
    assert_eq!(location.search, "?v=2");
    assert_eq!(outlet.render_tree(), "x-p\n  x-a\n");
}
