//! Application state: path addressing and the store contract

pub mod path;
pub mod store;

pub use path::{get_in, set_in, PathKey, StatePath};
pub use store::{MemoryStore, Store, StoreAction, StoreListener, StoreSubscription};
