//! Satori core library: shared domain types, status tracking, listeners,
//! the task boundary, and client configuration.
//!
//! - [`types`]: identifier newtypes and field values
//! - [`status`]: [`DataStatus`] tri-state tracker
//! - [`metadata`]: judge/parameter metadata descriptions
//! - [`listeners`]: token-based publish/subscribe lists
//! - [`task`]: scoped task boundary around remote work
//! - [`config`]: load / save `~/.satori/config.yaml`
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod listeners;
pub mod metadata;
pub mod status;
pub mod task;
pub mod types;

pub use config::ClientConfig;
pub use error::ConfigError;
pub use listeners::{Delivery, ListenerToken, Listeners};
pub use metadata::{InputKind, InputMetadata, ParametersMetadata, TestCaseMetadata};
pub use status::{DataStatus, Status};
pub use task::{TaskCancelled, TaskGuard, TaskHandler, TaskManager, TracingTaskManager};
pub use types::{BlobHash, BlobValue, FieldValue, InputKey, RecordId};
