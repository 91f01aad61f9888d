//! Redirect subsystem.
//!
//! # Data Flow
//! ```text
//! RedirectSpec (builder or RedirectConfig)
//!     → rule.rs (validate, compile patterns)
//!     → engine.rs (RedirectEngine, one per rule)
//!     → routing::Mount::Redirect (registration order, beside routes)
//!
//! Incoming request (Host header, path, scheme)
//!     → route table reaches the engine
//!     → match: 301/307 with Location, dispatch stops
//!     → no match: request continues to the next entry
//! ```
//!
//! # Design Decisions
//! - Rules compiled before start, immutable at runtime
//! - Changing host or scheme drops the source port
//! - Deterministic: same request always yields the same decision

pub mod engine;
pub mod matcher;
pub mod rule;

pub use engine::{split_authority, Redirect, RedirectEngine};
pub use matcher::{Pattern, PatternSource, RequestPredicate};
pub use rule::{RedirectRule, RedirectSpec};
