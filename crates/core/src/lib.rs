//! TorrentForge domain crate.
//!
//! Holds everything that does not speak HTTP: the configuration and task
//! stores, the activity log, artifact naming, the filesystem collaborators
//! (library scan, artifact listing, directory browsing) and the
//! [`builder`] capability that shells out to the torrent creation tool.

pub mod activity;
pub mod artifacts;
pub mod browse;
pub mod builder;
pub mod config;
pub mod error;
pub mod library;
pub mod naming;
pub mod persist;
pub mod task;
pub mod task_store;
pub mod types;
