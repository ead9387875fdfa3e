//! Custom extractors for Axum handlers.
//!
//! Both reject with [`AppError`](crate::errors::AppError), so malformed
//! requests get the same JSON error body as every other failure.

pub mod id_path;
pub mod json_body;

pub use id_path::IdPath;
pub use json_body::JsonBody;
