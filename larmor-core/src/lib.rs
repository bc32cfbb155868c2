//! Shared primitives, traits, and utilities for the Larmor NMR toolkit.
//!
//! `larmor-core` provides the foundation that the other Larmor crates build on:
//!
//! - **Error types** — [`LarmorError`] and [`Result`] for structured error handling
//! - **Traits** — Core abstractions like [`Scored`], [`Annotated`], [`ContentAddressable`]
//! - **Work crew** — [`WorkCrew`], a fixed-size worker pool with per-worker
//!   private scratch state for compute-heavy sampling loops

pub mod crew;
pub mod error;
pub mod traits;

pub use crew::{available_workers, CrewItem, WorkCrew};
pub use error::{LarmorError, Result};
pub use traits::*;
