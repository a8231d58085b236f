//! Organization Directory SDK
//!
//! This crate provides the public API for the org-directory module:
//! - `OrgDirectoryClientV1` trait for read-only directory queries
//! - Model types (`Organization`, `Building`, `OperationType`, `PhoneNumber`)
//! - Query types (`OrganizationFilter`, `ProximityQuery`, `GeoPoint`)
//! - Error type (`DirectoryError`)
//!
//! Consumers obtain the client from the module:
//! ```ignore
//! let client = module.client();
//! let orgs = client.search_by_operation_type(&cancel, Some("food")).await?;
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod errors;
pub mod models;

pub use api::OrgDirectoryClientV1;
pub use errors::{DirectoryError, NoMatchReason};
pub use models::{
    Building, GeoPoint, OperationType, Organization, OrganizationFilter, PhoneNumber,
    ProximityQuery,
};
