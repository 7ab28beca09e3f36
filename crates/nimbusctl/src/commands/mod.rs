//! Command implementations, one module per resource.

pub mod api;
pub mod async_utils;
pub mod cluster;
pub mod image;
pub mod profile;
pub mod subnet;
pub mod task;
pub mod vm;
pub mod volume_group;
