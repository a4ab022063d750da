mod common;

use common::{context_with, create_all, settle};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use viewbind::state::{StoreAction, Store};

fn names(children: &[Arc<viewbind::Component>]) -> Vec<String> {
    children.iter().map(|child| child.name().to_string()).collect()
}

/// Children come from `children` first, then `items`, without repeats
#[tokio::test]
async fn test_children_order_and_dedupe() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "page": {
                "type": "container",
                "children": {
                    "header": {"type": "label"},
                    "footer": {"type": "label"}
                },
                "items": ["sidebar", {"view": "header"}, "sidebar", "missing", 42, {"label": "no view"}]
            },
            "sidebar": {"type": "list"}
        }
    }));
    create_all(&ctx);
    let page = ctx.registry().get("page").unwrap();

    let children = page.get_children_component();
    assert_eq!(names(&children), vec!["header", "footer", "sidebar"]);
}

/// Repeated calls hand back the same cached list
#[tokio::test]
async fn test_children_are_cached() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "page": {"items": ["a", "b"]},
            "a": {},
            "b": {}
        }
    }));
    create_all(&ctx);
    let page = ctx.registry().get("page").unwrap();

    let first = page.get_children_component();
    let second = page.get_children_component();
    assert!(Arc::ptr_eq(&first, &second));

    page.reset_children();
    let third = page.get_children_component();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(names(&third), vec!["a", "b"]);
}

/// A menubar never resolves children
#[tokio::test]
async fn test_menubar_has_no_children() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "menu": {"type": "menubar", "items": ["file", "edit"]},
            "file": {},
            "edit": {}
        }
    }));
    create_all(&ctx);
    let menu = ctx.registry().get("menu").unwrap();
    assert!(menu.is_menubar());
    assert!(menu.get_children_component().is_empty());
}

/// Nested children resolve from the description found in the tree
#[tokio::test]
async fn test_nested_children_resolve() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "home": {
                "children": {
                    "body": {"children": {"table": {"type": "table"}}}
                }
            }
        }
    }));
    create_all(&ctx);
    let body = ctx.registry().get("body").unwrap();
    assert_eq!(names(&body.get_children_component()), vec!["table"]);
}

/// After `load`, a change of the component slice drops the cache
#[tokio::test]
async fn test_state_change_resets_children_cache() {
    let (ctx, store) = context_with(json!({
        "views": {
            "list": {"items": ["one"]},
            "one": {},
            "two": {}
        }
    }));
    create_all(&ctx);
    let list = ctx.registry().get("list").unwrap();
    list.load();

    assert_eq!(names(&list.get_children_component()), vec!["one"]);

    store
        .dispatch(StoreAction::AddJsonResource {
            resource: "list".to_string(),
            path: Some(list.state_path().clone()),
            collection: None,
            json: json!({"items": ["one", "two"]}),
        })
        .unwrap();
    settle().await;

    assert_eq!(names(&list.get_children_component()), vec!["one", "two"]);
}

/// A change elsewhere in the state keeps the cache
#[tokio::test]
async fn test_unrelated_change_keeps_children_cache() {
    let (ctx, store) = context_with(json!({
        "views": {"list": {"items": ["one"]}, "one": {}}
    }));
    create_all(&ctx);
    let list = ctx.registry().get("list").unwrap();
    list.load();
    let before = list.get_children_component();

    store
        .dispatch(StoreAction::AddJsonResource {
            resource: "settings".to_string(),
            path: None,
            collection: None,
            json: json!({"theme": "dark"}),
        })
        .unwrap();

    assert!(Arc::ptr_eq(&before, &list.get_children_component()));
}

/// Views listing each other as items render, size and update without
/// recursing forever
#[tokio::test]
async fn test_items_cycle_is_cut() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "a": {"label": "A", "items": ["b"]},
            "b": {"label": "B", "items": ["a"]}
        }
    }));
    create_all(&ctx);
    let a = ctx.registry().get("a").unwrap();
    let b = ctx.registry().get("b").unwrap();

    tokio_test::assert_ok!(b.render(false).await);
    tokio_test::assert_ok!(a.render(false).await);
    assert_eq!(names(&a.get_children_component()), vec!["b"]);
    assert_eq!(names(&b.get_children_component()), vec!["a"]);

    let size = a.resize(Some(120), Some(40));
    assert_eq!((size.width, size.height), (120, 40));
    a.update_size();

    let updates = Arc::new(AtomicUsize::new(0));
    for component in [&a, &b] {
        let counter = updates.clone();
        component.set_update_self(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }
    tokio_test::assert_ok!(a.update().await);
    settle().await;
    a.wait_idle().await;
    b.wait_idle().await;
    assert_eq!(updates.load(Ordering::SeqCst), 2);
}
