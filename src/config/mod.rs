//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FrontendConfig (validated)
//!     → applied through gate.rs mutators
//!
//! On start:
//!     gate.rs locks the settings
//!     → frozen ServiceConfig handed to the server
//!     → every later mutator fails with AlreadyStarted
//! ```
//!
//! # Design Decisions
//! - Settings are mutable only before the listener binds
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod gate;
pub mod loader;
pub mod schema;
pub mod validation;

pub use gate::{ConfigGate, Phase, ServiceConfig, StartGuard};
pub use schema::{BodyParserMode, FrontendConfig, RedirectConfig, StaticConfig};
