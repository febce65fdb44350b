//! Core types and trait definitions for the Trail visit history store.
//!
//! This crate is deliberately free of database dependencies. Backends
//! (e.g. `trail-store-sqlite`) implement [`store::VisitStore`]; callers depend
//! on the trait, not on any concrete backend.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod config;
pub mod detached;
pub mod error;
pub mod history;
pub mod store;

pub use error::{Error, Result};
