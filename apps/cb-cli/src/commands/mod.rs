//! CLI command implementations

pub mod asset;
pub mod diff;
pub mod import;
pub mod init;
pub mod pull;
pub mod push;
pub mod remote;
pub mod selection;
