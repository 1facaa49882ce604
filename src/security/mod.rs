//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (bounded body read)
//!     → target.rs (extract `url`, decode once, allowlist check)
//!     → headers.rs (strip hop-by-hop before forwarding)
//!     → Pass to upstream
//!
//! Upstream response:
//!     → headers.rs (relay only the narrow allowlist)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any validation failure before any outbound call
//! - No trust in client input

pub mod headers;
pub mod limits;
pub mod target;

pub use headers::HeaderSet;
pub use target::{AllowList, TargetValidator};
