pub mod app;
pub mod binding;
pub mod cli;
pub mod component;
pub mod config;
pub mod context;
pub mod dom;
pub mod error;
pub mod identity;
pub mod logging;
pub mod render;
pub mod services;
pub mod state;
pub mod stream;
pub mod ui;

pub use app::App;
pub use component::Component;
pub use config::EngineConfig;
pub use context::UiContext;
pub use error::{UiError, UiResult};
pub use stream::{Stream, Subscription};
