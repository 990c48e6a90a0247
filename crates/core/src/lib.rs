//! Core business logic for gridwatch.

pub mod services;

pub use services::*;
