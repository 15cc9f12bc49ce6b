//! CLI command implementations.

pub(crate) mod download;
pub(crate) mod info;
pub(crate) mod list;
