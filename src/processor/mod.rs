//! # Association Processor
//!
//! Entry point for the refresh-association plugin and the output record it
//! produces.

pub mod output;
pub mod refresh;

pub use output::{string_prefix, PluginResult, RefreshResult, ResultStatus};
pub use refresh::{
    is_apply_all, is_association_qualified_to_run_now, parse_association_ids,
    RefreshCollaborators, RefreshProcessor,
};
