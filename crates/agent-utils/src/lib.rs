//! Shared utilities for the stock advisor workspace
//!
//! This crate provides logging setup and small helpers for reading
//! configuration out of the process environment at startup.

pub mod config;
pub mod logging;

pub use config::{env_flag, env_opt, env_parse, load_dotenv, load_dotenv_from};
pub use logging::{LogFormat, LoggingConfig, init_tracing};
