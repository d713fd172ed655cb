//! All bits and pieces concerning the HTTP stub server live in this module.
//!
//! `core::StubServer` drives the lifecycle state machine (unstarted -> listening ->
//! closed) and owns the stub registry. The `hyper` submodule runs the actual HTTP
//! server answering incoming requests in a background thread.
mod builder;
mod core;
mod hyper;

pub use builder::StubServerBuilder;
pub use core::{ServerError, StubServer};
