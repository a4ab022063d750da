//! Asynchronous render pipeline
//!
//! - [`TaskQueue`]: per-component FIFO serializing renders and updates
//! - [`Renderer`]: vnode cache with the rebuild / build / patch decision
//! - [`Template`]: state to markup
//! - [`AssetRegistry`] / [`AssetTracker`]: asset readiness

pub mod assets;
pub mod queue;
pub mod renderer;
pub mod template;

pub use assets::{AssetRegistry, AssetTracker, AssetsPromise};
pub use queue::{QueueTicket, TaskQueue};
pub use renderer::Renderer;
pub use template::{DefaultTemplate, FnTemplate, RenderInput, Template, TemplateRegistry, VNode};
