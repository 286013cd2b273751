//! Common utilities and shared types for flock.
//!
//! This crate provides foundational components used across all flock crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Tokens**: JWT issuance and verification via [`JwtKeys`]
//!
//! # Example
//!
//! ```no_run
//! use flock_common::{Config, IdGenerator, AppResult};
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
pub mod id;
pub mod jwt;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use jwt::{Claims, JwtKeys};
