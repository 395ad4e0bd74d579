//! Merge commit and JIRA comment text.
//!
//! The texts are Handlebars formats from the run configuration, rendered with
//! the values of the pull request being merged.

mod error;
mod renderer;

pub use error::MessageError;
pub use renderer::{create_handlebars_registry, MergeMessages, MessageContext, MessageRenderer};
