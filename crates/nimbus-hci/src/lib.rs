//! # nimbus-hci
//!
//! REST client for the Nimbus HCI management API: VMs, volume groups,
//! images, subnets, clusters, and the asynchronous task endpoint that
//! tracks every mutating call.
//!
//! Two backend generations are supported, selected once at construction
//! via [`Dialect`]: the newer direct API and the older proxied API reached
//! through a fleet manager. See the [`dialect`] module for the differences.
//!
//! ```rust,no_run
//! use nimbus_hci::{Dialect, HciClient};
//!
//! # async fn example() -> Result<(), nimbus_hci::RestError> {
//! let client = HciClient::builder()
//!     .base_url("https://cluster.example.com:9440")
//!     .username("admin")
//!     .password("secret")
//!     .dialect(Dialect::Direct)
//!     .build()?;
//!
//! let vms = client.vms().list().await?;
//! for vm in vms {
//!     println!("{} {}", vm.uuid, vm.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod clusters;
pub mod dialect;
pub mod error;
pub mod images;
pub mod models;
pub mod subnets;
pub mod tasks;
pub mod vms;
pub mod volume_groups;

pub use client::{HciClient, HciClientBuilder};
pub use clusters::ClusterHandler;
pub use dialect::{Dialect, PROXY_CLUSTER_PARAM, is_success};
pub use error::{RestError, Result};
pub use images::ImageHandler;
pub use models::{
    ClusterSummary, DiskSpec, ImageCreateRequest, ImageSummary, NicSpec, PowerTransition,
    SubnetCreateRequest, SubnetSummary, TaskRef, VmCloneRequest, VmCreateRequest, VmSummary,
    VolumeGroupCreateRequest, VolumeGroupSummary,
};
pub use subnets::SubnetHandler;
pub use tasks::TaskHandler;
pub use vms::VmHandler;
pub use volume_groups::VolumeGroupHandler;
