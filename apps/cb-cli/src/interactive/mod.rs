//! Interactive prompting.
//!
//! Provides the prompting capability injected into commands and the
//! reconciler.

pub mod prompts;

pub use prompts::*;
