//! UI runtime surface: the component registry and the factory creating
//! components from view descriptions

pub mod factory;
pub mod registry;

pub use factory::{find_component_desc, UiFactory, DEFAULT_COMPONENT_TYPE};
pub use registry::UiRegistry;
