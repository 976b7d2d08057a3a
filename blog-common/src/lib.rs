//! # Blog Common Library
//!
//! Shared code for the blog workspace including:
//! - Database initialization and schema
//! - Configuration loading
//! - Common error type
//! - Timestamp and UUID helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
