//! Core types and trait definitions for the Nivaran grievance system.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod account;
pub mod category;
pub mod error;
pub mod grievance;
pub mod notification;
pub mod policy;
pub mod store;

pub use error::{Error, Result};
