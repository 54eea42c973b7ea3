//! Common utilities shared by the CLI and the tracing session

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
