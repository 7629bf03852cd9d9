//! Command-line front end for release readiness.
//!
//! - [`config`]: TOML + environment configuration and service construction
//! - [`report`]: text and JSON rendering of results

pub mod config;
pub mod report;
