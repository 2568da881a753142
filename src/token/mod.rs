//! Bounded token pool for shared-resource arbitration.
//!
//! Tokens are advisory capabilities: each binds a resource name and an
//! access mask to at most one owning task. The pool itself never touches
//! the guarded resource; correctness depends on callers consulting the
//! token they hold.

pub mod name;
pub mod pool;

pub use name::{ResourceName, MAX_RESOURCE_NAME_LEN};
pub use pool::{AccessMask, Token, TokenPool, TokenRequest, TOKEN_POOL_CAPACITY};
