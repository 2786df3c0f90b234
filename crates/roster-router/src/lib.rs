//! Action dispatch for the roster broker.
//!
//! Provides:
//! - `Action` - The fixed request catalog
//! - `ActionHandler` and the login/get/add/delete/update handlers
//! - `ActionRouter` - Completeness-checked dispatch table
//! - `StaticCredentials` - Exact-match login check

pub mod action;
pub mod credentials;
pub mod handlers;
pub mod router;

pub use action::Action;
pub use credentials::StaticCredentials;
pub use handlers::{ActionHandler, HandlerError};
pub use router::{ActionRouter, RouterBuilder, RouterError};
