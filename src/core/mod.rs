//! # Core Module
//!
//! Shared-ownership containers used to pass rendering systems around the
//! single-threaded render loop.
//!
//! ## Key Components
//! - `StResource`: Reference-counted value with interior mutability
//! - `StSystem`: Reference-counted boxed system with interior mutability

pub mod st_resource;
pub mod st_system;

pub use st_resource::StResource;
pub use st_system::StSystem;
