//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call (probe or forward):
//!     → jwt.rs issue(backend secret) → "Authorization: Bearer <token>"
//!
//! Inbound request (only when auth.enforce):
//!     → http/middleware/auth.rs
//!     → jwt.rs verify(multiplexer secret)
//! ```
//!
//! # Design Decisions
//! - One secret per backend; a token is never sent to a backend it was not signed for
//! - Secrets are validated at startup, so issuance cannot fail on a bad key at call time
//! - Secrets never appear in logs

pub mod jwt;

pub use jwt::{AuthError, JwtSecret};
