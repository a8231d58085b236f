//! Organization Directory Module Implementation
//!
//! Read-only directory of organizations, the buildings they occupy and the
//! operation types (categories) describing their activities.
//! The public API is defined in `org-directory-sdk` and re-exported here.
//!
//! ## Architecture
//!
//! - **domain**: query composition, category closure, proximity search, service
//! - **infra**: `SeaORM` and in-memory stores, migrations, dataset loading
//! - **module**: wires configuration, storage and the local client together

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

// === PUBLIC API (from SDK) ===
pub use org_directory_sdk::{
    Building, DirectoryError, GeoPoint, NoMatchReason, OperationType, OrgDirectoryClientV1,
    Organization, OrganizationFilter, PhoneNumber, ProximityQuery,
};

// === MODULE DEFINITION ===
pub mod module;
pub use module::OrgDirectoryModule;

// === CONFIGURATION ===
pub mod config;

pub mod auth;

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
