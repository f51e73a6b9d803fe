//! # Azure Provision
//!
//! Azure-style provisioning helpers built on `provision-framework`: configuration and
//! credential loading, per-area clients for resource groups, virtual networks, subnets,
//! network security groups and storage accounts, and the lifecycle that wires them to a
//! control plane.

pub mod clients;
pub mod config;
pub mod credentials;
pub mod lifecycle;
pub mod model;
