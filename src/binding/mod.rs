//! Bindings route values from a source to target component methods
//!
//! A source is a service operation, a timeline of one, a named stream or a
//! document event. Every binding owns its subscriptions; unsubscribing is
//! the only way they end.

pub mod config;
pub mod base;
pub mod emitter;
pub mod loader;
pub mod service;
pub mod stream;

pub use self::config::{
    BindingKind, BindingList, BindingSource, BindingSpec, RawBindingConfig, RawHandler, TargetSpec,
};
pub use self::base::{BindingCore, BindingState};
pub use self::emitter::BindingEmitter;
pub use self::loader::{BindingsLoader, LoadedBinding};
pub use self::service::BindingService;
pub use self::stream::BindingStream;

use crate::error::UiResult;
use std::sync::Arc;

/// One live subscription from a source to target methods
pub trait Binding: Send + Sync {
    fn core(&self) -> &BindingCore;

    /// Validate the declaration and start the subscription
    ///
    /// Precondition errors are returned before anything is subscribed.
    /// Asynchronous setup continues in the background; see
    /// [`BindingCore::settled`].
    fn build(self: Arc<Self>) -> UiResult<()>;

    fn id(&self) -> &str {
        self.core().id()
    }

    fn kind(&self) -> BindingKind {
        self.core().kind()
    }

    fn state(&self) -> BindingState {
        self.core().state()
    }

    fn unsubscribe(&self) -> bool {
        self.core().unsubscribe()
    }

    fn unsubscribe_state_update(&self) -> bool {
        self.core().unsubscribe_state_update()
    }
}
