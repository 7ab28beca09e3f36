//! Core library for Nimbus HCI tools.
//!
//! Everything the CLI does goes through here, and the pieces are usable
//! on their own:
//!
//! - [`config`] - named connection profiles in a TOML file, with
//!   `${VAR}` expansion for secrets
//! - [`registry`] - the session-wide cache of task outcomes and the
//!   shared completion signal
//! - [`watch`] - the poller that drives one task to a recorded outcome
//!   on every exit path
//! - [`session`] - a connection bundled with the registry, cancellation
//!   root, and inventory caches
//! - [`workflows`] - composed operations: issue a mutation, watch its
//!   task, fetch the result, roll back on partial failure
//!
//! # Example
//!
//! ```rust,ignore
//! use nimbus_hci::{HciClientBuilder, VmCreateRequest};
//! use nimbusctl_core::{Session, WatchOptions, workflows};
//!
//! let client = HciClientBuilder::new()
//!     .base_url("https://cluster.example.com:9440")
//!     .username("admin")
//!     .password("secret")
//!     .build()?;
//! let session = Session::new(client);
//!
//! let request = VmCreateRequest {
//!     name: "web-01".into(),
//!     num_vcpus: 4,
//!     memory_mb: 8192,
//!     ..Default::default()
//! };
//! let vm = workflows::vm::provision_vm_and_wait(
//!     &session,
//!     &request,
//!     &[],
//!     true,
//!     &WatchOptions::default(),
//!     None,
//! )
//! .await?;
//! println!("{vm:#}");
//! ```

pub mod config;
pub mod error;
pub mod progress;
pub mod registry;
pub mod session;
pub mod watch;
pub mod workflows;

pub use config::{Config, ConfigError, DialectKind, Profile};
pub use error::{CoreError, Result, RollbackOutcome};
pub use progress::{ProgressCallback, ProgressEvent};
pub use registry::{Disposition, TaskOutcome, TaskRegistry};
pub use session::Session;
pub use watch::{
    DEFAULT_FETCH_RETRY_LIMIT, DEFAULT_INTERVAL_CEILING, DEFAULT_TIMEOUT, WatchHandle,
    WatchOptions, spawn_watch, spawn_watch_linked, watch,
};
