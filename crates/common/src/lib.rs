//! Common utilities and shared types for gridwatch.
//!
//! This crate provides foundational components used across all gridwatch crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Geocoding**: Reverse geocoding via [`GeocodingResolver`]
//! - **Storage**: Media attachment storage via [`MediaStore`]
//!
//! # Example
//!
//! ```no_run
//! use gridwatch_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod geocode;
pub mod id;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use geocode::{GeocodingResolver, UNKNOWN_LOCATION};
pub use id::IdGenerator;
pub use storage::{MediaStore, generate_media_name};
