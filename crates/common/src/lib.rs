//! Common utilities and shared types for enrol-rs.
//!
//! This crate provides foundational components used across all enrol-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Session keys**: Anti-forgery tokens via [`SessionKeys`]
//!
//! # Example
//!
//! ```no_run
//! use enrol_common::{AppResult, Config, SessionKeys};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let keys = SessionKeys::new(&config.security.session_secret);
//!     let sesskey = keys.issue("01hx0000000000000000000000");
//!     assert!(keys.verify("01hx0000000000000000000000", &sesskey));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod session_key;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use session_key::SessionKeys;
