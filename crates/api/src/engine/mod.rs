//! Job execution engine.
//!
//! Contains the background processor that claims undispatched tasks and
//! runs the creation tool for each, plus the [`control::JobControl`] handle
//! the HTTP layer uses to wake it up and to cancel tasks in flight.

pub mod control;
pub mod processor;
