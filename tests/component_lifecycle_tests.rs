mod common;

use common::{context_with, create, settle};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use viewbind::binding::{BindingKind, BindingState};
use viewbind::services::LocalService;
use viewbind::{UiContext, UiError};

fn register_resources(ctx: &Arc<UiContext>) {
    let service = LocalService::new("resources", ctx.scheduler(), ctx.config().stream_capacity)
        .with_operation("get", |_operands| Ok(json!({"rows": [1, 2, 3]})));
    ctx.services().register(Arc::new(service));
}

fn table_state() -> serde_json::Value {
    json!({
        "views": {
            "table": {
                "type": "table",
                "bindings": {
                    "services": [
                        {"service": "resources", "method": "get", "target_method": "set_object_value"}
                    ]
                }
            }
        }
    })
}

/// Unloading a component that was never loaded is a precondition failure
#[tokio::test]
async fn test_unload_before_load_fails() {
    let (ctx, _store) = context_with(json!({"views": {"idle": {}}}));
    let idle = create(&ctx, "idle");

    let result = idle.unload();
    assert!(matches!(result, Err(UiError::Precondition(_))));
}

/// A second `load` does not subscribe to the store again
#[tokio::test]
async fn test_load_is_idempotent() {
    let (ctx, store) = context_with(json!({"views": {"panel": {"type": "panel"}}}));
    let panel = create(&ctx, "panel");

    panel.load();
    panel.load();
    assert!(panel.is_loaded());
    assert!(panel.is_observing_store());
    assert_eq!(store.listener_count(), 1);
}

/// A service binding delivers the operation result to the target method,
/// and unload releases both the binding and the store observer
#[tokio::test]
async fn test_service_binding_lifecycle() {
    let (ctx, store) = context_with(table_state());
    register_resources(&ctx);
    let table = create(&ctx, "table");

    table.load();
    assert_eq!(table.init_bindings().unwrap(), 1);
    assert_eq!(table.binding_count(), 1);

    let binding = table.bindings().pop().unwrap();
    assert_eq!(binding.kind(), BindingKind::Service);
    assert!(binding.id().starts_with("binding_"));
    assert_eq!(binding.core().settled().await, BindingState::Bound);
    settle().await;

    assert_eq!(table.get_object_value(), Some(json!({"rows": [1, 2, 3]})));

    table.unload().unwrap();
    assert_eq!(table.binding_count(), 0);
    assert_eq!(binding.state(), BindingState::Unsubscribed);
    assert!(!binding.core().is_subscribed());
    assert!(!table.is_observing_store());
    assert!(!table.is_loaded());
    assert_eq!(store.listener_count(), 0);

    // A second unload finds nothing left to release.
    table.unload().unwrap();
}

/// Unload while a service binding is still waiting for its service cancels
/// the setup: the late service never reaches the component
#[tokio::test]
async fn test_unload_during_service_setup() {
    let (ctx, _store) = context_with(table_state());
    let table = create(&ctx, "table");

    table.load();
    table.init_bindings().unwrap();
    let binding = table.bindings().pop().unwrap();
    settle().await;
    assert_eq!(binding.state(), BindingState::Binding);

    table.unload().unwrap();
    assert_eq!(binding.state(), BindingState::Unsubscribed);

    register_resources(&ctx);
    settle().await;

    assert_eq!(binding.state(), BindingState::Unsubscribed);
    assert!(!binding.core().is_subscribed());
    assert_eq!(table.get_text_value(), "");
}

/// A missing operation fails the binding in the background
#[tokio::test]
async fn test_service_binding_with_unknown_operation_fails() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "table": {
                "bindings": {"services": [
                    {"service": "resources", "method": "delete", "target_method": "set_text_value"}
                ]}
            }
        }
    }));
    register_resources(&ctx);
    let table = create(&ctx, "table");
    table.load();
    table.init_bindings().unwrap();

    let binding = table.bindings().pop().unwrap();
    assert!(matches!(binding.core().settled().await, BindingState::Failed(_)));
    settle().await;

    // Only bindings with a live or pending subscription stay on the component.
    assert_eq!(table.binding_count(), 0);
    assert!(table.binding(binding.id()).is_none());
    tokio_test::assert_ok!(table.unload());
}

/// A service operation that panics while the binding sets up fails the
/// binding instead of leaving it waiting forever
#[tokio::test]
async fn test_panicking_service_setup_fails_the_binding() {
    let (ctx, _store) = context_with(table_state());
    let service = LocalService::new("resources", ctx.scheduler(), ctx.config().stream_capacity)
        .with_operation("get", |_operands| panic!("backend exploded"));
    ctx.services().register(Arc::new(service));
    let table = create(&ctx, "table");
    table.load();
    table.init_bindings().unwrap();

    let binding = table.bindings().pop().unwrap();
    let settled = tokio::time::timeout(Duration::from_secs(1), binding.core().settled()).await;
    assert!(matches!(tokio_test::assert_ok!(settled), BindingState::Failed(_)));
    settle().await;
    assert_eq!(table.binding_count(), 0);
}

/// A poller interval too large for a duration is ignored and the binding
/// still binds
#[tokio::test]
async fn test_oversized_poller_interval_is_ignored() {
    let (ctx, _store) = context_with(json!({
        "views": {
            "table": {"bindings": {"services": [{
                "service": "resources",
                "method": "get",
                "target_method": "set_object_value",
                "options": {"method": {"poller": {"name": "forever", "interval_seconds": 1e30}}}
            }]}}
        }
    }));
    register_resources(&ctx);
    let table = create(&ctx, "table");
    table.load();
    table.init_bindings().unwrap();

    let binding = table.bindings().pop().unwrap();
    let settled = tokio::time::timeout(Duration::from_secs(1), binding.core().settled()).await;
    assert_eq!(tokio_test::assert_ok!(settled), BindingState::Bound);
    assert!(!ctx.scheduler().is_scheduled("forever"));
    assert_eq!(table.binding_count(), 1);
}

/// Load after unload subscribes to the store again
#[tokio::test]
async fn test_reload_reattaches_store_observer() {
    let (ctx, store) = context_with(json!({"views": {"panel": {}}}));
    let panel = create(&ctx, "panel");

    panel.load();
    panel.unload().unwrap();
    assert_eq!(store.listener_count(), 0);

    panel.load();
    assert!(panel.is_loaded());
    assert!(panel.is_observing_store());
    assert_eq!(store.listener_count(), 1);
}

/// `destroy` detaches the element and unregisters the component
#[tokio::test]
async fn test_destroy_unregisters_component() {
    let (ctx, _store) = context_with(json!({"views": {"toast": {"label": "Saved"}}}));
    let toast = create(&ctx, "toast");
    toast.render(false).await.unwrap();
    assert!(ctx.document().get_element_by_id("toast").is_some());

    toast.destroy();
    assert!(ctx.document().get_element_by_id("toast").is_none());
    assert!(!ctx.registry().contains("toast"));
}
