//! Request handlers, one module per resource.

pub mod artifacts;
pub mod browse;
pub mod config;
pub mod health;
pub mod library;
pub mod logs;
pub mod tasks;

use torrentforge_core::task::Category;

use crate::error::{AppError, AppResult};

/// Parse a category path or body value, rejecting unknown labels with 400.
pub(crate) fn parse_category(value: &str) -> AppResult<Category> {
    Category::parse(value).ok_or_else(|| AppError::BadRequest(format!("Unknown category: {value}")))
}
