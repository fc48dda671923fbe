//! cb-cli - keep a local asset tree and a remote platform system in sync
//!
//! The library holds everything the binary does so that the reconciliation
//! flow can be driven against any [`api::AssetClient`].

pub mod api;
pub mod batch;
pub mod cache;
pub mod commands;
pub mod config;
pub mod diff;
pub mod error;
pub mod interactive;
pub mod logging;
pub mod models;
pub mod output;
pub mod plan;
pub mod reconcile;
pub mod resource;
pub mod session;
