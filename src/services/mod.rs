//! Services module for viewbind
//!
//! Services provide the data bindings consume. Each service exposes named
//! operations whose results arrive on reactive streams, optionally re-issued
//! by pollers and summarized by timelines.

pub mod local;
pub mod poller;
pub mod registry;
pub mod scheduler;
pub mod timeline;

pub use local::{LocalOperation, LocalService, OperationHandler};
pub use poller::PollerSettings;
pub use registry::{Service, ServiceOperation, ServiceRegistry};
pub use scheduler::{Scheduler, TimerAction, TimerToken};
pub use timeline::{FieldSpec, Timeline, TimelineSample, TimelineSettings, Transform};
