//! # tenantauth-core
//!
//! Core types and contracts for tenant directory sign-in.
//!
//! This crate provides the shared error taxonomy, strongly-typed identifiers, the tenant and
//! user entities, directory provider configuration types, and the store contracts that the
//! directory sign-in core consumes.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and response mapping
//! - [`uuid`] - Strongly-typed UUID wrappers for tenants and users
//! - [`config`] - Service settings for directory operations
//! - [`provider`] - Directory provider configuration and public provider summaries
//! - [`user`] - Tenant, user, role and linked provider identities
//! - [`store`] - Collaborator contracts for configuration and user persistence
//! - [`memory`] - In-memory store implementations

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod memory;
pub mod provider;
pub mod store;
pub mod user;
pub mod uuid;

// Re-export commonly used types
pub use error::{Error, Result};
