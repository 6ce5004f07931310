//! Artifact creation through an external command-line tool.
//!
//! [`executor::ArtifactBuilder`] is the capability the job processor depends
//! on. [`mktorrent::MktorrentBuilder`] is the production implementation; all
//! process management (spawn, output capture, timeout, cancellation) lives in
//! [`subprocess`].

pub mod binary;
pub mod executor;
pub mod mktorrent;
pub mod subprocess;

pub use executor::{ArtifactBuilder, BuildError, BuildOutput, BuildRequest, ToolStatus};
pub use mktorrent::MktorrentBuilder;
