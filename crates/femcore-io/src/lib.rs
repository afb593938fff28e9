//! Persistence for femcore domains.
//!
//! This crate provides:
//! - **Domain records**: JSON input describing dof managers, materials,
//!   cross sections, time functions and elements
//! - **Element contexts**: save/restore of element configuration and
//!   integration-point history

pub mod context;
pub mod error;
pub mod record;

pub use context::{
    CONTEXT_SCHEMA_VERSION, DomainContext, ElementContext, restore_context, save_context,
};
pub use error::{IoError, Result};
pub use record::{DofManagerRecord, DomainRecord, MaterialRecord, load_domain, load_domain_record};
