//! Run configuration loading.
//!
//! The configuration file names the organization, the repositories to scan
//! (grouped into components), the JIRA server and the priority that gates
//! merging. It is read once, before any network activity.

mod error;
mod run_config;

pub use error::ConfigError;
pub use run_config::{Component, MessageFormats, RunConfig};
