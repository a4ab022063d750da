mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::{context_with, create, create_all, settle};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use viewbind::binding::{BindingKind, BindingState};
use viewbind::services::{LocalService, TimelineSettings};
use viewbind::state::StoreAction;
use viewbind::{Stream, UiError};

/// A declaration with an explicit empty target list fails synchronously
#[tokio::test]
async fn test_empty_targets_is_a_precondition_failure() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "table": {"bindings": {"services": [
                {"service": "resources", "method": "get", "targets": [], "target_method": "set_text_value"}
            ]}}
        }
    }));
    let table = create(&ctx, "table");
    table.load();

    let result = table.init_bindings();
    assert!(matches!(result, Err(UiError::Precondition(_))));
    assert_eq!(table.binding_count(), 0);
}

/// A declaration without a target method fails synchronously
#[tokio::test]
async fn test_missing_target_method_is_a_precondition_failure() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "table": {"bindings": {"emitter_dom": [
                {"dom_selector": "#save", "dom_event": "click"}
            ]}}
        }
    }));
    let table = create(&ctx, "table");

    let result = table.init_bindings();
    assert!(result.unwrap_err().is_precondition());
    assert_eq!(table.binding_count(), 0);
}

/// Unknown binding types are rejected
#[tokio::test]
async fn test_unknown_binding_type_is_rejected() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "table": {"bindings": {"services": [
                {"type": "websocket", "service": "resources", "method": "get", "target_method": "set_text_value"}
            ]}}
        }
    }));
    let table = create(&ctx, "table");
    assert!(table.init_bindings().unwrap_err().is_precondition());
}

/// A timeline keeps at most `max` samples taken more than the interval
/// apart, and a timeline binding receives the whole series
#[tokio::test]
async fn test_timeline_binding_receives_sample_window() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "chart": {"bindings": {"services": [
                {"service": "stats", "method": "get", "timeline": "load", "target_method": "set_object_value"}
            ]}}
        }
    }));
    let service = LocalService::new("stats", ctx.scheduler(), ctx.config().stream_capacity)
        .with_operation("get", |_operands| Ok(json!({"cpu": 0})));
    let settings = TimelineSettings::from_value(&json!({
        "name": "load", "transform": "cpu", "max": 3, "interval_seconds": 1
    }))
    .unwrap();
    let timeline = service.add_timeline("get", settings).unwrap();
    ctx.services().register(Arc::new(service));

    let start = Utc::now();
    let at = |ms: i64| start + ChronoDuration::milliseconds(ms);
    assert!(timeline.record(&json!({"cpu": 10}), at(0)));
    assert!(!timeline.record(&json!({"cpu": 11}), at(500)));
    assert!(timeline.record(&json!({"cpu": 20}), at(1500)));
    assert!(timeline.record(&json!({"cpu": 30}), at(3000)));
    assert!(timeline.record(&json!({"datas": {"cpu": 40}}), at(4500)));

    let values: Vec<_> = timeline.samples().into_iter().map(|s| s.value).collect();
    assert_eq!(values, vec![json!(20), json!(30), json!(40)]);

    let chart = create(&ctx, "chart");
    chart.load();
    assert_eq!(chart.init_bindings().unwrap(), 1);
    let binding = chart.bindings().pop().unwrap();
    assert_eq!(binding.kind(), BindingKind::Timeline);
    assert_eq!(binding.core().settled().await, BindingState::Bound);
    settle().await;

    let shown = chart.get_object_value().unwrap();
    let shown: Vec<_> = shown
        .as_array()
        .unwrap()
        .iter()
        .map(|sample| sample["value"].clone())
        .collect();
    assert_eq!(shown, vec![json!(20), json!(30), json!(40)]);
}

/// A stream binding resolves a named stream of another view
#[tokio::test]
async fn test_named_stream_binding() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "source": {},
            "display": {"bindings": {"streams": [
                {"source_stream": "Ticks", "source_type": "views", "source_selector": "source",
                 "target_method": "set_text_value"}
            ]}}
        }
    }));
    create_all(&ctx);
    let source = ctx.registry().get("source").unwrap();
    let display = ctx.registry().get("display").unwrap();
    let ticks = Stream::new("ticks", 16);
    source.register_named_stream("ticks", ticks.clone());

    assert_eq!(display.init_bindings().unwrap(), 1);
    let binding = display.bindings().pop().unwrap();
    assert_eq!(binding.kind(), BindingKind::Stream);
    assert_eq!(binding.state(), BindingState::Bound);

    ticks.push(json!("tick 1"));
    settle().await;
    assert_eq!(display.get_text_value(), "tick 1");

    assert!(binding.unsubscribe());
    ticks.push(json!("tick 2"));
    settle().await;
    assert_eq!(display.get_text_value(), "tick 1");
}

/// A stream binding whose stream does not exist is dropped
#[tokio::test]
async fn test_unresolved_stream_binding_is_dropped() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "display": {"bindings": {"streams": [
                {"source_stream": "nothing", "target_method": "set_text_value"}
            ]}}
        }
    }));
    let display = create(&ctx, "display");
    assert_eq!(display.init_bindings().unwrap(), 0);
}

/// An emitter with handlers fans out into one binding per handler
#[tokio::test]
async fn test_emitter_handlers_fan_out() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "toolbar": {"bindings": {"emitter_dom": [{
                "dom_selector": "#save",
                "dom_event": "click",
                "handlers": [
                    {"targets": ["log"], "target_method": "set_text_value"},
                    {"targets": ["counter"], "target_method": "set_object_value"}
                ]
            }]}},
            "log": {},
            "counter": {}
        }
    }));
    create_all(&ctx);
    let toolbar = ctx.registry().get("toolbar").unwrap();

    assert_eq!(toolbar.init_bindings().unwrap(), 2);
    let mut ids = toolbar.binding_ids();
    ids.sort();
    assert!(ids[0].ends_with("_0"));
    assert!(ids[1].ends_with("_1"));
    assert_eq!(
        ids[0].trim_end_matches("_0"),
        ids[1].trim_end_matches("_1")
    );
    for binding in toolbar.bindings() {
        assert_eq!(binding.kind(), BindingKind::EmitterDom);
        assert_eq!(binding.state(), BindingState::Bound);
    }

    assert!(ctx.document().emit("#save", "click", json!({"x": 1})));
    settle().await;

    let log = ctx.registry().get("log").unwrap();
    let counter = ctx.registry().get("counter").unwrap();
    assert_eq!(log.get_text_value(), "{\"x\":1}");
    assert_eq!(counter.get_object_value(), Some(json!({"x": 1})));
}

/// A binding with a state path also writes each value into the owner state
#[tokio::test]
async fn test_state_path_binding_dispatches() {
    let (ctx, store) = context_with(json!({
        "views": {
            "status": {"bindings": {"emitter_jquery": [
                {"dom_selector": "status-button", "dom_event": "press",
                 "target_method": "set_text_value", "state_path": ["last", "pressed"]}
            ]}}
        }
    }));
    let status = create(&ctx, "status");
    status.load();
    assert_eq!(status.init_bindings().unwrap(), 1);
    let binding = status.bindings().pop().unwrap();
    assert!(binding.core().has_state_update());

    ctx.document().emit("status-button", "press", json!("yes"));
    settle().await;

    assert_eq!(status.get_text_value(), "yes");
    let actions = store.actions();
    assert_eq!(actions.len(), 1);
    let StoreAction::AddJsonResource { json, .. } = &actions[0];
    assert_eq!(json["last"]["pressed"], json!("yes"));

    status.unload().unwrap();
    assert!(!binding.core().has_state_update());
}

/// Operands under `options.method` reach the operation, pollers included
#[tokio::test(start_paused = true)]
async fn test_service_binding_poller() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "feed": {"bindings": {"services": [{
                "service": "news",
                "method": "latest",
                "target_method": "set_object_value",
                "options": {"method": {"poller": {"name": "news-refresh", "interval_milliseconds": 100}}}
            }]}}
        }
    }));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let service = LocalService::new("news", ctx.scheduler(), ctx.config().stream_capacity)
        .with_operation("latest", move |_operands| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(json!({"edition": n}))
        });
    ctx.services().register(Arc::new(service));

    let feed = create(&ctx, "feed");
    feed.load();
    feed.init_bindings().unwrap();
    let binding = feed.bindings().pop().unwrap();
    assert_eq!(binding.core().settled().await, BindingState::Bound);
    assert!(ctx.scheduler().is_scheduled("news-refresh"));

    tokio::time::sleep(Duration::from_millis(350)).await;
    let total = calls.load(Ordering::SeqCst);
    assert!(total >= 3, "expected at least 3 calls, got {}", total);

    settle().await;
    let shown = feed.get_object_value().unwrap();
    assert!(shown["edition"].as_u64().unwrap() >= 3);

    ctx.scheduler().cancel_all();
}
