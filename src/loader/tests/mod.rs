use super::test_helpers::*;
use super::*;
use crate::types::TodoFilter;
use serde_json::json;
use std::time::Duration;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn create_test_loader(base_url: &str) -> (SectionLoader, Arc<RecordingView>) {
    let view = Arc::new(RecordingView::default());
    let loader = SectionLoader::new(test_config(base_url), view.clone())
        .expect("failed to create loader");
    (loader, view)
}

/// Window long enough for a spawned fetch to reach the mock server
const IN_FLIGHT_WINDOW: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// End-to-end success and shape failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn end_to_end_posts_render_ten_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("_limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_posts(10)))
        .expect(1)
        .mount(&server)
        .await;

    let (loader, view) = create_test_loader(&server.uri()).await;
    let mut events = loader.subscribe();

    assert_ok!(loader.start(&"posts".into()).await);
    let loaded = wait_for_event(&mut events, |e| {
        matches!(e, SectionEvent::Loaded { section, .. } if section.as_str() == "posts")
    })
    .await;

    assert!(matches!(loaded, SectionEvent::Loaded { count: 10, .. }));

    let renders = view.renders_for("posts").await;
    assert_eq!(renders.len(), 1);
    assert_eq!(renders[0].as_array().unwrap().len(), 10);
    assert!(view.errors_for("posts").await.is_empty());
    assert!(!loader.is_loading(&"posts".into()).await);
    assert!(loader.payload(&"posts".into()).await.is_some());

    // loading flag was raised and dropped around the settlement
    let calls = view.calls().await;
    assert!(calls.contains(&ViewCall::Loading {
        section: "posts".into(),
        loading: true,
    }));
    assert!(calls.contains(&ViewCall::Loading {
        section: "posts".into(),
        loading: false,
    }));
    server.verify().await;
}

#[tokio::test]
async fn malformed_item_surfaces_shape_error() {
    let mut items = sample_posts(10);
    items.as_array_mut().unwrap()[7]
        .as_object_mut()
        .unwrap()
        .remove("body");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items))
        .mount(&server)
        .await;

    let (loader, view) = create_test_loader(&server.uri()).await;
    let mut events = loader.subscribe();

    loader.start(&"posts".into()).await.unwrap();
    wait_for_event(&mut events, |e| {
        matches!(e, SectionEvent::Failed { section, .. } if section.as_str() == "posts")
    })
    .await;

    assert_eq!(
        view.errors_for("posts").await,
        vec!["The server returned data in an unexpected format.".to_string()]
    );
    assert!(view.renders_for("posts").await.is_empty());
    assert!(loader.payload(&"posts".into()).await.is_none());
}

#[tokio::test]
async fn http_failure_surfaces_server_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;

    let (loader, view) = create_test_loader(&server.uri()).await;
    let mut events = loader.subscribe();

    loader.start(&"posts".into()).await.unwrap();
    let failed = wait_for_event(&mut events, |e| {
        matches!(e, SectionEvent::Failed { section, .. } if section.as_str() == "posts")
    })
    .await;

    match failed {
        SectionEvent::Failed { message, .. } => {
            assert_eq!(message, "Server error 404: Not Found");
        }
        _ => unreachable!(),
    }
    assert_eq!(
        view.errors_for("posts").await,
        vec!["Server error 404: Not Found".to_string()]
    );
}

// ---------------------------------------------------------------------------
// Supersession and cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn superseded_request_settles_silently() {
    let server = MockServer::start().await;
    // the first request hangs long enough to be superseded, the second
    // settles immediately
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(30)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_posts(10)))
        .mount(&server)
        .await;

    let (loader, view) = create_test_loader(&server.uri()).await;
    let mut events = loader.subscribe();

    loader.start(&"posts".into()).await.unwrap();
    tokio::time::sleep(IN_FLIGHT_WINDOW).await;
    loader.start(&"posts".into()).await.unwrap();

    // drain events up to the winning settlement; the superseded request
    // must not surface anything
    let mut seen = Vec::new();
    loop {
        let event = wait_for_event(&mut events, |_| true).await;
        let done = matches!(event, SectionEvent::Loaded { .. });
        seen.push(event);
        if done {
            break;
        }
    }
    assert!(
        !seen
            .iter()
            .any(|e| matches!(e, SectionEvent::Canceled { .. } | SectionEvent::Failed { .. })),
        "superseded settlement leaked into the event stream: {seen:?}"
    );

    assert!(view.errors_for("posts").await.is_empty());
    assert_eq!(view.renders_for("posts").await.len(), 1);
    assert!(!loader.is_loading(&"posts".into()).await);
}

#[tokio::test]
async fn explicit_cancel_surfaces_canceled_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let (loader, view) = create_test_loader(&server.uri()).await;
    let mut events = loader.subscribe();

    loader.start(&"posts".into()).await.unwrap();
    tokio::time::sleep(IN_FLIGHT_WINDOW).await;
    loader.cancel(&"posts".into()).await.unwrap();

    wait_for_event(&mut events, |e| {
        matches!(e, SectionEvent::Canceled { section } if section.as_str() == "posts")
    })
    .await;

    assert_eq!(
        view.errors_for("posts").await,
        vec!["Request canceled by user.".to_string()]
    );
    assert!(view.renders_for("posts").await.is_empty());
    assert!(!loader.is_loading(&"posts".into()).await);
}

#[tokio::test]
async fn cancel_without_in_flight_request_is_a_no_op() {
    let server = MockServer::start().await;
    let (loader, view) = create_test_loader(&server.uri()).await;

    loader.cancel(&"posts".into()).await.unwrap();
    loader.cancel_all().await;

    assert!(view.calls().await.is_empty());
}

#[tokio::test]
async fn cancel_all_routes_each_section_to_its_own_view_calls() {
    let server = MockServer::start().await;
    for endpoint in ["/posts", "/todos"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;
    }

    let (loader, view) = create_test_loader(&server.uri()).await;
    let mut events = loader.subscribe();

    loader.refresh_all().await;
    tokio::time::sleep(IN_FLIGHT_WINDOW).await;
    loader.cancel_all().await;

    let mut canceled = std::collections::HashSet::new();
    while canceled.len() < 2 {
        let event = wait_for_event(&mut events, |e| {
            matches!(e, SectionEvent::Canceled { .. })
        })
        .await;
        if let SectionEvent::Canceled { section } = event {
            canceled.insert(section.as_str().to_string());
        }
    }
    assert!(canceled.contains("posts") && canceled.contains("todos"));

    assert_eq!(
        view.errors_for("posts").await,
        vec!["Request canceled by user.".to_string()]
    );
    assert_eq!(
        view.errors_for("todos").await,
        vec!["Request canceled by user.".to_string()]
    );
    assert!(view.renders_for("posts").await.is_empty());
    assert!(view.renders_for("todos").await.is_empty());
}

#[tokio::test]
async fn failure_of_one_section_leaves_the_other_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(sample_todos(&[false, true, false])),
        )
        .mount(&server)
        .await;

    let (loader, view) = create_test_loader(&server.uri()).await;
    let mut events = loader.subscribe();

    loader.refresh_all().await;
    let mut posts_failed = false;
    let mut todos_loaded = false;
    while !(posts_failed && todos_loaded) {
        let event = wait_for_event(&mut events, |_| true).await;
        match event {
            SectionEvent::Failed { ref section, .. } if section.as_str() == "posts" => {
                posts_failed = true;
            }
            SectionEvent::Loaded { ref section, .. } if section.as_str() == "todos" => {
                todos_loaded = true;
            }
            _ => {}
        }
    }

    assert!(view.errors_for("todos").await.is_empty());
    assert_eq!(view.renders_for("todos").await.len(), 1);
    assert!(view.renders_for("posts").await.is_empty());
    assert!(loader.payload(&"todos".into()).await.is_some());
    assert!(loader.payload(&"posts".into()).await.is_none());
}

// ---------------------------------------------------------------------------
// Cached-payload operations
// ---------------------------------------------------------------------------

async fn loaded_todos_fixture() -> (MockServer, SectionLoader, Arc<RecordingView>) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .and(query_param("_limit", "12"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(sample_todos(&[false, true, false])),
        )
        .mount(&server)
        .await;

    let (loader, view) = create_test_loader(&server.uri()).await;
    let mut events = loader.subscribe();
    loader.start(&"todos".into()).await.unwrap();
    wait_for_event(&mut events, |e| {
        matches!(e, SectionEvent::Loaded { section, .. } if section.as_str() == "todos")
    })
    .await;

    (server, loader, view)
}

#[tokio::test]
async fn toggle_item_updates_cache_and_rerenders() {
    let (_server, loader, view) = loaded_todos_fixture().await;

    loader.toggle_item(&"todos".into(), 1, true).await.unwrap();

    let cached = loader.payload(&"todos".into()).await.unwrap();
    assert_eq!(cached[0]["completed"], serde_json::Value::Bool(true));

    let renders = view.renders_for("todos").await;
    assert_eq!(renders.len(), 2);
    assert_eq!(renders[1][0]["completed"], serde_json::Value::Bool(true));
}

#[tokio::test]
async fn toggle_of_unknown_item_is_a_no_op() {
    let (_server, loader, view) = loaded_todos_fixture().await;
    let renders_before = view.renders_for("todos").await.len();

    loader.toggle_item(&"todos".into(), 99, true).await.unwrap();

    let cached = loader.payload(&"todos".into()).await.unwrap();
    assert_eq!(cached, sample_todos(&[false, true, false]));
    // nothing changed, nothing re-rendered
    assert_eq!(view.renders_for("todos").await.len(), renders_before);
}

#[tokio::test]
async fn set_filter_renders_filtered_view_without_mutating_cache() {
    let (_server, loader, view) = loaded_todos_fixture().await;

    loader
        .set_filter(&"todos".into(), TodoFilter::Completed)
        .await
        .unwrap();

    let renders = view.renders_for("todos").await;
    let filtered = renders.last().unwrap().as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["id"], serde_json::json!(2));

    // cache keeps all three items
    let cached = loader.payload(&"todos".into()).await.unwrap();
    assert_eq!(cached.as_array().unwrap().len(), 3);
}

// ---------------------------------------------------------------------------
// Lookup failures and initial state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_section_is_rejected_everywhere() {
    let server = MockServer::start().await;
    let (loader, _view) = create_test_loader(&server.uri()).await;
    let nope: SectionId = "nope".into();

    assert!(matches!(
        loader.start(&nope).await,
        Err(Error::UnknownSection(_))
    ));
    assert!(matches!(
        loader.cancel(&nope).await,
        Err(Error::UnknownSection(_))
    ));
    assert!(matches!(
        loader.toggle_item(&nope, 1, true).await,
        Err(Error::UnknownSection(_))
    ));
    assert!(matches!(
        loader.set_filter(&nope, TodoFilter::All).await,
        Err(Error::UnknownSection(_))
    ));
}

#[tokio::test]
async fn sections_start_idle_and_empty() {
    let server = MockServer::start().await;
    let (loader, _view) = create_test_loader(&server.uri()).await;

    assert!(!loader.is_loading(&"posts".into()).await);
    assert!(loader.payload(&"posts".into()).await.is_none());
    assert!(!loader.is_loading(&"todos".into()).await);
    assert!(loader.payload(&"todos".into()).await.is_none());
}

#[tokio::test]
async fn invalid_config_is_rejected_at_construction() {
    let mut config = test_config("http://127.0.0.1:1");
    config.http.request_timeout = Duration::ZERO;

    let result = SectionLoader::new(config, Arc::new(RecordingView::default()));
    assert!(matches!(result, Err(Error::Config { .. })));
}
