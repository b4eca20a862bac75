//! # Dosha Common Library
//!
//! Shared code for the dosha assessment workspace:
//! - Error type and result alias
//! - TOML configuration and its resolution order
//! - Logging initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
