//! JWT User Types - Shared domain types
//!
//! This crate contains the plain data that flows through a cookie session:
//! - The decoded token payload ([`ClaimSet`])
//! - The result of a successful cookie login ([`SessionDescriptor`])
//! - Per-request facts the core needs from the host ([`RequestContext`])

pub mod claims;
pub mod request;
pub mod session;

pub use claims::*;
pub use request::*;
pub use session::*;
