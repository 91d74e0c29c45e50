//! Register - filter expressions and permission-filtered queries for a member registry
//!
//! This library provides the core functionality for Register, including:
//! - Filter expression parsing (infix to postfix) and predicate building
//! - Object-level ACLs and permission-restricted, paged queries
//! - Database operations and migrations
//! - Registry models and repositories
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```
//! use register::filter::{build_filter, parse_filter};
//!
//! let postfix = parse_filter("subject:*show* OR published:true AND createdBy:alice");
//! assert_eq!(postfix.len(), 5);
//!
//! let predicate = build_filter("subject:*show*");
//! assert!(!predicate.is_all());
//! ```

pub mod acl;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod models;
pub mod query;
pub mod repo;
