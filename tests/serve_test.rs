//! End-to-end request handling through the in-process client.

use hookroute::header::HeaderValue;
use hookroute::{
    get, mock, path, post, response, use_effect, CleanupContext, Method, Outcome, StatusCode,
};

mod common;
use common::{body_text, Trace};

fn mark(
    name: &'static str,
) -> impl Fn(hookroute::Request) -> std::future::Ready<Outcome> + Send + Sync + 'static {
    move |_| {
        std::future::ready(Outcome::cleanup(move |mut cx: CleanupContext| async move {
            cx.response
                .headers_mut()
                .insert(name, HeaderValue::from_static("true"));
            cx.response
        }))
    }
}

#[tokio::test]
async fn test_get_request() {
    let client = mock(|| {
        get("/", |_| async { "foo" });
    })
    .unwrap();
    let response = client.fetch("http://www.example.com").await.unwrap();
    assert_eq!(body_text(&response), "foo");
}

#[tokio::test]
async fn test_post_request() {
    let client = mock(|| {
        post("", |_| async { "foo" });
    })
    .unwrap();
    let response = client
        .fetch_with(Method::POST, "http://www.example.com", "")
        .await
        .unwrap();
    assert_eq!(body_text(&response), "foo");
}

#[tokio::test]
async fn test_head_request() {
    let client = mock(|| {
        get("", |_| async {
            let mut response = response::text("Hello");
            response
                .headers_mut()
                .insert("foo", HeaderValue::from_static("bar"));
            response
        });
    })
    .unwrap();
    let response = client
        .fetch_with(Method::HEAD, "http://www.example.com", "")
        .await
        .unwrap();
    assert_eq!(response.headers()["foo"], "bar");
    assert_eq!(body_text(&response), "");
}

#[tokio::test]
async fn test_path_simple_request() {
    let client = mock(|| {
        path("/foo", || {
            get("/", |_| async { "foo" });
        });
    })
    .unwrap();
    let response = client.fetch("/foo").await.unwrap();
    assert_eq!(body_text(&response), "foo");

    let response = client.fetch("/foo/").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(&response), "foo");
}

#[tokio::test]
async fn test_nested_paths() {
    let client = mock(|| {
        path("/foo", || {
            get("", |_| async { "foo" });
            path("/bar", || {
                get("", |_| async { "bar" });
            });
        });
    })
    .unwrap();

    assert_eq!(body_text(&client.fetch("/foo").await.unwrap()), "foo");
    assert_eq!(body_text(&client.fetch("/foo/bar").await.unwrap()), "bar");
}

#[tokio::test]
async fn test_encapsulated_effects() {
    let client = mock(|| {
        use_effect(mark("1"));
        get("", |_| async {});

        path("/foo", || {
            use_effect(mark("2"));
            get("", |_| async {});
        });

        path("/bar", || {
            use_effect(mark("3"));
            get("", |_| async {});

            path("/baz", || {
                use_effect(mark("4"));
                get("", |_| async {});
            });
        });
    })
    .unwrap();

    let cases = [
        ("/", [true, false, false, false]),
        ("/foo", [true, true, false, false]),
        ("/bar", [true, false, true, false]),
        ("/bar/baz", [true, false, true, true]),
    ];
    for (uri, expected) in cases {
        let response = client.fetch(uri).await.unwrap();
        let seen = ["1", "2", "3", "4"].map(|name| response.headers().contains_key(name));
        assert_eq!(seen, expected, "effects seen for {uri}");
    }
}

#[tokio::test]
async fn test_effect_as_guard() {
    let trace = Trace::default();
    let reached = trace.clone();
    let client = mock(move || {
        use_effect(|_| async { Outcome::respond(response::text("guarded")) });
        get("/", move |_| {
            reached.push("handler");
            async { "foo" }
        });
    })
    .unwrap();

    let response = client.fetch("/").await.unwrap();
    assert_eq!(body_text(&response), "guarded");
    assert_eq!(trace.get(), "");
}

#[tokio::test]
async fn test_cleanup_replaces_response() {
    let client = mock(|| {
        use_effect(|_| async {
            Outcome::cleanup(|cx: CleanupContext| async move {
                String::from_utf8_lossy(cx.response.body()).to_uppercase()
            })
        });
        get("/", |_| async { "foo" });
    })
    .unwrap();

    let response = client.fetch("/").await.unwrap();
    assert_eq!(body_text(&response), "FOO");
}

#[tokio::test]
async fn test_effects_run_in_order() {
    let trace = Trace::default();
    let t = trace.clone();
    let client = mock(move || {
        let (a, b, h) = (t.clone(), t.clone(), t.clone());
        use_effect(move |_| {
            a.push("1");
            let a = a.clone();
            async move { Outcome::cleanup(move |_| async move { a.push("5") }) }
        });
        use_effect(move |_| {
            b.push("2");
            let b = b.clone();
            async move { Outcome::cleanup(move |_| async move { b.push("4") }) }
        });
        get("/", move |_| {
            h.push("3");
            async {}
        });
    })
    .unwrap();

    client.fetch("/").await.unwrap();
    assert_eq!(trace.get(), "12345");
}

#[tokio::test]
async fn test_effects_run_in_order_inside_paths() {
    let trace = Trace::default();
    let t = trace.clone();
    let client = mock(move || {
        let outer = t.clone();
        use_effect(move |_| {
            outer.push("1");
            let outer = outer.clone();
            async move { Outcome::cleanup(move |_| async move { outer.push("7") }) }
        });

        let (group, handler) = (t.clone(), t.clone());
        path("", move || {
            use_effect(move |_| {
                group.push("3");
                let group = group.clone();
                async move { Outcome::cleanup(move |_| async move { group.push("5") }) }
            });
            get("", move |_| {
                handler.push("4");
                async {}
            });
        });

        let late = t.clone();
        use_effect(move |_| {
            late.push("2");
            let late = late.clone();
            async move { Outcome::cleanup(move |_| async move { late.push("6") }) }
        });
    })
    .unwrap();

    client.fetch("/").await.unwrap();
    assert_eq!(trace.get(), "1234567");
}

#[tokio::test]
async fn test_unmatched_and_wrong_method() {
    let client = mock(|| {
        get("/items/:id", |cx| async move {
            format!("item {}", cx.params.get("id").unwrap_or_default())
        });
    })
    .unwrap();

    let response = client.fetch("/items/7").await.unwrap();
    assert_eq!(body_text(&response), "item 7");

    let response = client.fetch("/nothing").await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(&response), "404 Not Found");

    let response = client
        .fetch_with(Method::PUT, "/items/7", "")
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["allow"], "GET, HEAD");
}

#[tokio::test]
async fn test_effect_error_becomes_500_and_cleanups_still_run() {
    let trace = Trace::default();
    let t = trace.clone();
    let client = mock(move || {
        use_effect(move |_| {
            let t = t.clone();
            async move {
                Outcome::cleanup(move |cx: CleanupContext| async move {
                    if let Some(error) = cx.error {
                        t.push(&error.to_string());
                    }
                })
            }
        });
        use_effect(|_| async { Err::<Outcome, _>(std::io::Error::other("effect failed")) });
        get("/", |_| async { "unreachable" });
    })
    .unwrap();

    let response = client.fetch("/").await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(&response), "500 Internal Server Error");
    assert_eq!(trace.get(), "effect failed");
}

#[tokio::test]
async fn test_panicking_handler_is_contained() {
    let client = mock(|| {
        get("/boom", |cx| async move {
            if cx.params.is_empty() {
                panic!("handler panicked");
            }
            "never"
        });
        get("/ok", |_| async { "still serving" });
    })
    .unwrap();

    let response = client.fetch("/boom").await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = client.fetch("/ok").await.unwrap();
    assert_eq!(body_text(&response), "still serving");
}

#[tokio::test]
async fn test_non_canonical_path_redirects() {
    let client = mock(|| {
        get("/a/b", |_| async { "ab" });
    })
    .unwrap();

    let response = client.fetch("/a//b").await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "/a/b");

    let response = client.fetch("/a%2Fb?q=1").await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "/a/b?q=1");

    let response = client.fetch("/a/%62").await.unwrap();
    assert_eq!(body_text(&response), "ab");
}

#[tokio::test]
async fn test_guard_response_reaches_outer_cleanup() {
    let trace = Trace::default();
    let t = trace.clone();
    let client = mock(move || {
        let (outer, handler) = (t.clone(), t.clone());
        use_effect(move |_| {
            let outer = outer.clone();
            async move {
                Outcome::cleanup(move |cx: CleanupContext| async move {
                    outer.push(&format!("cleanup:{};", cx.response.status().as_u16()));
                })
            }
        });
        use_effect(|_| async { Outcome::respond(response::forbidden()) });
        get("/", move |_| {
            handler.push("handler;");
            async { "foo" }
        });
    })
    .unwrap();

    let response = client.fetch("/").await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(&response), "403 Forbidden");
    assert_eq!(trace.get(), "cleanup:403;");
}

#[tokio::test]
async fn test_guard_inside_group_skips_later_route_effects() {
    let trace = Trace::default();
    let t = trace.clone();
    let client = mock(move || {
        let outer = t.clone();
        use_effect(move |_| {
            let outer = outer.clone();
            async move {
                Outcome::cleanup(move |cx: CleanupContext| async move {
                    outer.push(&format!("outer:{};", cx.response.status().as_u16()));
                })
            }
        });

        let (later, handler) = (t.clone(), t.clone());
        path("/admin", move || {
            use_effect(|request: hookroute::Request| async move {
                if request.headers().contains_key("authorization") {
                    Outcome::next()
                } else {
                    Outcome::respond(response::forbidden())
                }
            });
            use_effect(move |_| {
                later.push("later;");
                async {}
            });
            get("", move |_| {
                handler.push("handler;");
                async { "admin" }
            });
        });

        get("/public", |_| async { "public" });
    })
    .unwrap();

    let response = client.fetch("/admin").await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(trace.get(), "outer:403;");

    let response = client.fetch("/public").await.unwrap();
    assert_eq!(body_text(&response), "public");
    assert_eq!(trace.get(), "outer:403;outer:200;");
}
