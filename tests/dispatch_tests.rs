mod common;

use common::{context_with, create};
use serde_json::{json, Value};
use std::sync::Arc;
use viewbind::state::{get_in, StatePath, Store, StoreAction};
use viewbind::UiError;

/// Paths that are not a non-empty array of keys dispatch nothing
#[tokio::test]
async fn test_malformed_paths_dispatch_nothing() {
    let (ctx, store) = context_with(json!({"views": {"form": {"type": "form"}}}));
    let form = create(&ctx, "form");

    for path in [json!([]), json!("not-an-array"), json!(["a", true]), json!(null)] {
        form.dispatch_update_state_value_action(&path, json!(5)).unwrap();
    }
    assert!(store.actions().is_empty());
}

/// A value path produces exactly one action carrying the whole component
/// state with the value set
#[tokio::test]
async fn test_value_path_dispatches_one_action() {
    let (ctx, store) = context_with(json!({
        "views": {"form": {"type": "form", "a": {"c": 1}}}
    }));
    let form = create(&ctx, "form");

    form.dispatch_update_state_value_action(&json!(["a", "b"]), json!(5))
        .unwrap();

    let actions = store.actions();
    assert_eq!(actions.len(), 1);
    let StoreAction::AddJsonResource {
        resource,
        path,
        json,
        ..
    } = &actions[0];
    assert_eq!(resource, "form");
    assert_eq!(path.as_ref(), StatePath::from_value(&json!(["views", "form"])).as_ref());
    assert_eq!(json["a"]["b"], json!(5));
    assert_eq!(json["a"]["c"], json!(1));
    assert_eq!(json["type"], json!("form"));

    let state = store.get_state();
    let stored = get_in(&state, form.state_path().keys()).unwrap();
    assert_eq!(stored["a"]["b"], json!(5));
}

/// Index keys create arrays in the dispatched state
#[tokio::test]
async fn test_value_path_with_index() {
    let (ctx, store) = context_with(json!({"views": {"grid": {"rows": [10, 20]}}}));
    let grid = create(&ctx, "grid");

    grid.dispatch_update_state_value_action(&json!(["rows", 1]), json!(25))
        .unwrap();

    let StoreAction::AddJsonResource { json, .. } = &store.actions()[0];
    assert_eq!(json["rows"], json!([10, 25]));
}

/// An index past the end of an array is refused instead of padding the
/// array up to it
#[tokio::test]
async fn test_value_path_index_past_the_end_dispatches_nothing() {
    let (ctx, store) = context_with(json!({"views": {"grid": {"rows": [10, 20]}}}));
    let grid = create(&ctx, "grid");

    for path in [
        json!(["rows", u64::MAX]),
        json!(["rows", 1_000_000_000_000u64]),
        json!(["rows", 3]),
        json!(["fresh", 1]),
    ] {
        tokio_test::assert_ok!(grid.dispatch_update_state_value_action(&path, json!(1)));
    }
    assert!(store.actions().is_empty());
    assert_eq!(grid.get_state_value("rows"), Some(json!([10, 20])));

    tokio_test::assert_ok!(grid.dispatch_update_state_value_action(&json!(["rows", 2]), json!(30)));
    let StoreAction::AddJsonResource { json, .. } = &store.actions()[0];
    assert_eq!(json["rows"], json!([10, 20, 30]));
}

/// Only objects replace the component state
#[tokio::test]
async fn test_non_object_state_is_ignored() {
    let (ctx, store) = context_with(json!({"views": {"form": {}}}));
    let form = create(&ctx, "form");

    form.dispatch_update_state_action(json!(3)).unwrap();
    form.dispatch_update_state_action(json!(["x"])).unwrap();
    assert!(store.actions().is_empty());

    form.dispatch_update_state_action(json!({"label": "Saved"}))
        .unwrap();
    assert_eq!(store.actions().len(), 1);
    assert_eq!(form.get_state_value("label"), Some(json!("Saved")));
}

/// A description read from another component is registered as a view and
/// rendered inside the caller
#[tokio::test]
async fn test_register_and_render_inside_from_json() {
    let (ctx, store) = context_with(json!({
        "views": {
            "editor": {"type": "editor"},
            "canvas": {"type": "canvas"}
        }
    }));
    let editor = create(&ctx, "editor");
    let canvas = create(&ctx, "canvas");
    canvas.render(false).await.unwrap();
    editor
        .set_object_value(&json!({"name": "widget", "type": "label", "label": "Hi"}))
        .unwrap();

    let options = json!({
        "is_event_handler": true,
        "data": {"json_source_view": "editor", "json_source_getter": "get_object_value"}
    });
    let ticket = canvas.register_and_render_inside_from_json(&options).unwrap();
    ticket.await.unwrap();

    let actions = store.actions();
    assert_eq!(actions.len(), 1);
    let StoreAction::AddJsonResource {
        resource, collection, ..
    } = &actions[0];
    assert_eq!(resource, "widget");
    assert_eq!(collection.as_deref(), Some("views"));

    let widget = ctx.registry().get("widget").unwrap();
    assert_eq!(widget.kind(), "label");
    let element = ctx.document().get_element_by_id("widget").unwrap();
    assert!(Arc::ptr_eq(
        &element.parent().unwrap(),
        &canvas.get_dom_element().unwrap()
    ));
    assert!(element.markup().contains("Hi"));
}

/// Bad options are rejected without dispatching
#[tokio::test]
async fn test_register_from_json_rejects_bad_options() {
    let (ctx, store) = context_with(json!({
        "views": {"editor": {}, "canvas": {}}
    }));
    let editor = create(&ctx, "editor");
    let canvas = create(&ctx, "canvas");
    editor.set_object_value(&json!({"type": "label"})).unwrap();

    let cases: Vec<Value> = vec![
        json!("options"),
        json!({"json_source_getter": "get_object_value"}),
        json!({"json_source_view": "editor"}),
        json!({"json_source_view": "nowhere", "json_source_getter": "get_object_value"}),
        json!({"json_source_view": "editor", "json_source_getter": "no_such_getter"}),
        // The description has no name.
        json!({"json_source_view": "editor", "json_source_getter": "get_object_value"}),
    ];
    for options in cases {
        assert!(canvas.register_from_json(&options).is_none());
    }
    assert!(store.actions().is_empty());
}

/// Rendering inside a component without an element yields nothing
#[tokio::test]
async fn test_render_inside_requires_an_element() {
    let (ctx, _store) = context_with(json!({"views": {"canvas": {}}}));
    let canvas = create(&ctx, "canvas");
    assert!(canvas
        .render_inside_from_json("widget", &json!({"type": "label"}))
        .is_none());
}

/// Unknown target methods are reported; registered ones win over built-ins
#[tokio::test]
async fn test_invoke_method() {
    let (ctx, _store) = context_with(json!({"views": {"label": {}}}));
    let label = create(&ctx, "label");

    let result = label.invoke_method("explode", json!(1), &Value::Null);
    assert!(matches!(
        result,
        Err(UiError::UnknownMethod { ref method, .. }) if method == "explode"
    ));

    label
        .invoke_method("set_text_value", json!("plain"), &Value::Null)
        .unwrap();
    assert_eq!(label.get_text_value(), "plain");

    label.register_method("set_text_value", |component, value, _options| {
        component.set_text_value(&json!(format!("custom {}", value)))
    });
    label
        .invoke_method("set_text_value", json!(2), &Value::Null)
        .unwrap();
    assert_eq!(label.get_text_value(), "custom 2");
}
